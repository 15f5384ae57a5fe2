//! Helpers for asserting on drawn frames

use ratatui::{backend::TestBackend, buffer::Buffer, Frame, Terminal};

/// The rows of `buffer` as plain text, trailing spaces trimmed.
pub fn buffer_lines(buffer: &Buffer) -> Vec<String> {
    let area = buffer.area;
    (area.top()..area.bottom())
        .map(|y| {
            let row: String = (area.left()..area.right())
                .map(|x| buffer[(x, y)].symbol())
                .collect();
            row.trim_end().to_string()
        })
        .collect()
}

/// Draw once into a `width` x `height` test terminal and return the lines.
///
/// Panics if the test backend fails, which it does not in practice.
pub fn render_to_lines_with(width: u16, height: u16, draw: impl FnOnce(&mut Frame)) -> Vec<String> {
    let mut terminal = Terminal::new(TestBackend::new(width, height))
        .unwrap_or_else(|err| panic!("test terminal: {err}"));
    terminal
        .draw(draw)
        .unwrap_or_else(|err| panic!("draw: {err}"));
    buffer_lines(terminal.backend().buffer())
}
