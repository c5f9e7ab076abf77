use crate::dock::WindowHandle;
use crate::geometry::Rect;
use crate::view_model::ViewModel;

/// The window the cards live in. Painting is the implementor's business; the
/// controller only tells it what to show and where.
pub trait Surface: Send {
    fn handle(&self) -> WindowHandle;

    /// Drop every card and create one per VM (and one tile per host) in
    /// model order.
    fn rebuild(&mut self, model: &ViewModel);

    fn set_geometry(&mut self, window: Rect);

    /// Card rectangles in the same order as the last rebuild's VMs.
    fn place_cards(&mut self, cards: &[Rect]);

    /// Show a one-line message to the user.
    fn notify(&mut self, notice: &str);
}
