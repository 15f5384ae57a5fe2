//! Component trait for terminal UI elements

use ratatui::{layout::Rect, Frame};

use crate::event::EventKind;

/// A terminal UI element that renders from props and reports what the user
/// did as values of `A`.
///
/// Components never touch the engine. Whatever `handle_event` returns is
/// handed to the host, which turns it into an engine call. Cursor position
/// and other purely visual state may live in `&mut self`.
///
/// ```ignore
/// impl Component<TextEdit> for TextInput {
///     type Props<'a> = TextInputProps<'a>;
///
///     fn handle_event(&mut self, event: &EventKind, props: Self::Props<'_>) -> impl IntoIterator<Item = TextEdit> {
///         // ...
///     }
///
///     fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
///         frame.render_widget(Paragraph::new(props.value), area);
///     }
/// }
/// ```
pub trait Component<A> {
    /// Data required to render the component (read-only)
    type Props<'a>;

    /// Handle an event and return what the user did.
    ///
    /// Returns any `IntoIterator<Item = A>`: `None`, `Some(a)` or a `Vec`.
    /// The default returns nothing (display-only components).
    #[allow(unused_variables)]
    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = A> {
        None::<A>
    }

    /// Render the component to the frame
    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>);
}
