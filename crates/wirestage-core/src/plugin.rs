//! The plugin contract: event hooks plus two render slots.
//!
//! Plugins are held in an ordered list. For every physical event the core's
//! own handling runs first, then each plugin's hook in registration order.
//! A hook returning [`EventOutcome::Claimed`] short-circuits the plugins
//! after it for that event only; there is no other isolation, and a later
//! plugin observes whatever state an earlier one wrote.

use crate::input::{KeyboardEvent, PointerEvent, WheelEvent};
use crate::scene::Scene;
use crate::stage::StageContext;

/// Explicit claim flag returned by every event hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOutcome {
    /// The plugin did not claim the event; later plugins still run.
    #[default]
    Pass,
    /// The plugin claimed the event; later plugins are skipped.
    Claimed,
}

impl EventOutcome {
    pub fn is_claimed(&self) -> bool {
        matches!(self, EventOutcome::Claimed)
    }
}

/// Auxiliary behavior hooked into the stage's event stream.
///
/// Every method has a no-op default, so a plugin declares only the hooks
/// and render slots it actually uses. Hooks receive the raw event and the
/// full stage context (store, camera, drag session, actions).
#[allow(unused_variables)]
pub trait StagePlugin {
    /// Stable name, used for logging.
    fn name(&self) -> &str;

    fn on_pointer_down(&mut self, event: &PointerEvent, ctx: &mut StageContext) -> EventOutcome {
        EventOutcome::Pass
    }

    fn on_window_pointer_move(
        &mut self,
        event: &PointerEvent,
        ctx: &mut StageContext,
    ) -> EventOutcome {
        EventOutcome::Pass
    }

    fn on_window_pointer_up(
        &mut self,
        event: &PointerEvent,
        ctx: &mut StageContext,
    ) -> EventOutcome {
        EventOutcome::Pass
    }

    fn on_key_down(&mut self, event: &KeyboardEvent, ctx: &mut StageContext) -> EventOutcome {
        EventOutcome::Pass
    }

    fn on_key_up(&mut self, event: &KeyboardEvent, ctx: &mut StageContext) -> EventOutcome {
        EventOutcome::Pass
    }

    fn on_wheel(&mut self, event: &WheelEvent, ctx: &mut StageContext) -> EventOutcome {
        EventOutcome::Pass
    }

    /// Render slot painted behind the elements (world coordinates).
    fn view_back(&self, ctx: &StageContext, scene: &mut Scene) {}

    /// Render slot painted in front of the elements (world coordinates).
    fn view_front(&self, ctx: &StageContext, scene: &mut Scene) {}
}

/// Flatten a nested plugin list into registration order.
///
/// Hosts often assemble plugin sets from sub-lists; ordering is the
/// concatenation of the groups in the order given.
pub fn flatten_plugins(
    groups: Vec<Vec<Box<dyn StagePlugin>>>,
) -> Vec<Box<dyn StagePlugin>> {
    groups.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl StagePlugin for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_flatten_preserves_group_order() {
        let plugins = flatten_plugins(vec![
            vec![
                Box::new(Named("pan")) as Box<dyn StagePlugin>,
                Box::new(Named("select")),
            ],
            vec![Box::new(Named("wires"))],
        ]);
        let names: Vec<&str> = plugins.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["pan", "select", "wires"]);
    }
}
