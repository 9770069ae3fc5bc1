use ratatui::Frame;
use ratatui::layout::Rect;

/// Something that draws itself into a region of the frame.
///
/// Props are struct fields set by the parent before drawing. `render` takes
/// `&mut self` so a component can refresh caches (message heights, caret
/// scroll) during the draw pass, the same way ratatui's `StatefulWidget`
/// mutates its state.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// Turns low-level terminal events into component-level events.
///
/// Returning `None` means the event was ignored or fully handled
/// internally; the caller may route it elsewhere.
pub trait EventHandler {
    type Event;

    fn handle_event(&mut self, event: &super::event::TuiEvent) -> Option<Self::Event>;
}
