//! Drawing a render tree and turning keys into interactions
//!
//! [`SurfaceView`] lays out a [`RenderTree<TuiWidget>`] top to bottom,
//! keeps keyboard focus on one interactive node, and reports what the user
//! did as [`WidgetEvent`]s. The host feeds those to `Engine::interact` and
//! redraws from a fresh tree.
//!
//! | Focused widget | Keys | Interaction |
//! |---|---|---|
//! | `Button` | Enter, Space | `Press` |
//! | `CheckBox` | Enter, Space | `Toggle(!checked)` |
//! | `TextField` | typing, Backspace, Delete | `Edit(text)` |
//! | `TextField` with an action | Enter | `Press` |
//! | `Slider` | Left, Right | `Edit(number)` |
//! | `MultipleChoice` | Up, Down to move; Enter, Space to pick | `Select(values)` |
//! | `Tabs` | Left, Right | view only |
//!
//! Tab and Shift+Tab move focus.

use std::collections::HashMap;
use std::io;

use crossterm::event::KeyCode;
use ratatui::{
    backend::TestBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use surface_dispatch_core::{ComponentTraits, DataValue, Interaction, RenderChild, RenderNode, RenderTree};

use crate::component::Component;
use crate::event::EventKind;
use crate::text_input::{TextEdit, TextInput, TextInputProps};
use crate::widget::{Axis, TextHint, TuiWidget};

type Node = RenderNode<TuiWidget>;

/// A gesture for the host to apply with `Engine::interact`.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetEvent {
    pub surface_id: String,
    pub component_id: String,
    pub interaction: Interaction,
}

pub struct SurfaceViewProps<'a> {
    pub tree: &'a RenderTree<TuiWidget>,
}

/// Focus and cursor state for one surface.
#[derive(Debug, Default)]
pub struct SurfaceView {
    focus: Option<String>,
    inputs: HashMap<String, TextInput>,
    /// Highlighted option per choice
    option_cursor: HashMap<String, usize>,
    /// Active tab per `Tabs`
    active_tab: HashMap<String, usize>,
}

impl SurfaceView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    /// Focus `id` if it is focusable in `tree`.
    pub fn focus(&mut self, tree: &RenderTree<TuiWidget>, id: &str) -> bool {
        let found = self.focusable(tree).contains(&id);
        if found {
            self.focus = Some(id.to_string());
        }
        found
    }

    pub fn select_tab(&mut self, tabs_id: &str, index: usize) {
        self.active_tab.insert(tabs_id.to_string(), index);
    }

    /// Focusable ids in drawing order.
    pub fn focusable<'t>(&self, tree: &'t RenderTree<TuiWidget>) -> Vec<&'t str> {
        let mut ids = Vec::new();
        if let Some(root) = tree.root_node() {
            self.collect_focusable(root, &mut ids);
        }
        ids
    }

    fn collect_focusable<'t>(&self, node: &'t Node, ids: &mut Vec<&'t str>) {
        if node.traits.contains(ComponentTraits::INTERACTIVE)
            || matches!(node.widget, TuiWidget::Tabs { .. })
        {
            ids.push(&node.id);
        }
        for child in self.visible_children(node) {
            self.collect_focusable(child, ids);
        }
    }

    /// Children drawn as separate nodes. A button's subtree is its label,
    /// and tabs show only the active child.
    fn visible_children<'t>(&self, node: &'t Node) -> Vec<&'t Node> {
        match &node.widget {
            TuiWidget::Button { .. } => Vec::new(),
            TuiWidget::Tabs { .. } => node
                .children
                .get(self.tab_index(node))
                .and_then(RenderChild::node)
                .into_iter()
                .collect(),
            _ => node.child_nodes().collect(),
        }
    }

    fn tab_index(&self, node: &Node) -> usize {
        let current = self.active_tab.get(&node.id).copied().unwrap_or(0);
        current.min(node.children.len().saturating_sub(1))
    }

    /// Drop focus that no longer points at a focusable node, and focus the
    /// first one when nothing is.
    fn sync_focus(&mut self, tree: &RenderTree<TuiWidget>) {
        let ids = self.focusable(tree);
        let valid = self
            .focus
            .as_deref()
            .is_some_and(|focus| ids.contains(&focus));
        if !valid {
            self.focus = ids.first().map(|id| id.to_string());
        }
    }

    fn move_focus(&mut self, tree: &RenderTree<TuiWidget>, forward: bool) {
        let ids = self.focusable(tree);
        if ids.is_empty() {
            return;
        }
        let current = self
            .focus
            .as_deref()
            .and_then(|focus| ids.iter().position(|id| *id == focus));
        let next = match (current, forward) {
            (Some(i), true) => (i + 1) % ids.len(),
            (Some(i), false) => (i + ids.len() - 1) % ids.len(),
            (None, _) => 0,
        };
        self.focus = Some(ids[next].to_string());
    }

    /// Draw `tree` into an off-screen `width` x `height` buffer and return
    /// its rows as text.
    pub fn render_to_lines(
        &mut self,
        tree: &RenderTree<TuiWidget>,
        width: u16,
        height: u16,
    ) -> io::Result<Vec<String>> {
        let mut terminal = Terminal::new(TestBackend::new(width, height))?;
        terminal.draw(|frame| {
            let area = frame.area();
            self.render(frame, area, SurfaceViewProps { tree });
        })?;
        Ok(crate::testing::buffer_lines(terminal.backend().buffer()))
    }

    fn focused_event(
        &mut self,
        tree: &RenderTree<TuiWidget>,
        code: KeyCode,
        event: &EventKind,
    ) -> Option<WidgetEvent> {
        let node = tree.find(self.focus.as_deref()?)?;
        let interaction = self.key_event(node, code, event)?;
        Some(WidgetEvent {
            surface_id: tree.surface_id.clone(),
            component_id: node.id.clone(),
            interaction,
        })
    }

    fn key_event(&mut self, node: &Node, code: KeyCode, event: &EventKind) -> Option<Interaction> {
        match &node.widget {
            TuiWidget::Button { .. } => {
                matches!(code, KeyCode::Enter | KeyCode::Char(' ')).then_some(Interaction::Press)
            }
            TuiWidget::CheckBox { checked, .. } => {
                matches!(code, KeyCode::Enter | KeyCode::Char(' '))
                    .then_some(Interaction::Toggle(!checked))
            }
            TuiWidget::TextField { value, submits, label, .. } => {
                let input = self.inputs.entry(node.id.clone()).or_default();
                let props = TextInputProps {
                    value,
                    label,
                    placeholder: "",
                    is_focused: true,
                };
                input
                    .handle_event(event, props)
                    .into_iter()
                    .find_map(|edit| match edit {
                        TextEdit::Changed(text) => Some(Interaction::Edit(DataValue::from(text))),
                        TextEdit::Submitted(_) if *submits => Some(Interaction::Press),
                        TextEdit::Submitted(_) => None,
                    })
            }
            TuiWidget::Slider { value, min, max, .. } => {
                let delta = match code {
                    KeyCode::Left => -1.0,
                    KeyCode::Right => 1.0,
                    _ => return None,
                };
                slider_step(*value, *min, *max, delta).map(Interaction::Edit)
            }
            TuiWidget::Choice {
                options,
                selected,
                max_selections,
            } => {
                if options.is_empty() {
                    return None;
                }
                let cursor = self.option_cursor.entry(node.id.clone()).or_default();
                *cursor = (*cursor).min(options.len() - 1);
                match code {
                    KeyCode::Up => {
                        *cursor = cursor.saturating_sub(1);
                        None
                    }
                    KeyCode::Down => {
                        *cursor = (*cursor + 1).min(options.len() - 1);
                        None
                    }
                    KeyCode::Enter | KeyCode::Char(' ') => {
                        pick(selected, &options[*cursor].value, *max_selections)
                            .map(Interaction::Select)
                    }
                    _ => None,
                }
            }
            TuiWidget::Tabs { .. } => {
                let current = self.tab_index(node);
                let last = node.children.len().saturating_sub(1);
                let next = match code {
                    KeyCode::Left => current.saturating_sub(1),
                    KeyCode::Right => (current + 1).min(last),
                    _ => return None,
                };
                self.active_tab.insert(node.id.clone(), next);
                None
            }
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------------

    fn height_of(&self, node: &Node) -> u16 {
        match &node.widget {
            TuiWidget::Text { text, .. } => text.lines().count().max(1) as u16,
            TuiWidget::TextField { .. } => 3,
            TuiWidget::Choice { options, .. } => options.len().max(1) as u16,
            TuiWidget::Stack {
                axis: Axis::Horizontal,
            } => self
                .visible_children(node)
                .into_iter()
                .map(|child| self.height_of(child))
                .max()
                .unwrap_or(0),
            TuiWidget::Stack { axis: Axis::Vertical } | TuiWidget::Modal => self.column_height(node),
            TuiWidget::Card => self.column_height(node).saturating_add(2),
            TuiWidget::Tabs { .. } | TuiWidget::Unknown { .. } => {
                self.column_height(node).saturating_add(1)
            }
            TuiWidget::Image { .. }
            | TuiWidget::Icon { .. }
            | TuiWidget::Divider
            | TuiWidget::Button { .. }
            | TuiWidget::CheckBox { .. }
            | TuiWidget::Slider { .. } => 1,
        }
    }

    fn column_height(&self, node: &Node) -> u16 {
        self.visible_children(node)
            .into_iter()
            .fold(0u16, |total, child| total.saturating_add(self.height_of(child)))
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, node: &Node) {
        if area.is_empty() {
            return;
        }
        let focused = self.focus.as_deref() == Some(node.id.as_str());
        let highlight = if focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };

        match &node.widget {
            TuiWidget::Text { text, hint } => {
                let style = match hint {
                    TextHint::Heading => Style::default().add_modifier(Modifier::BOLD),
                    TextHint::Caption => Style::default().fg(Color::DarkGray),
                    TextHint::Body => Style::default(),
                };
                frame.render_widget(Paragraph::new(text.as_str()).style(style), area);
            }
            TuiWidget::Image { url } => {
                let style = Style::default().fg(Color::DarkGray);
                frame.render_widget(Paragraph::new(format!("[media] {url}")).style(style), area);
            }
            TuiWidget::Icon { name } => {
                frame.render_widget(Paragraph::new(format!("({name})")), area);
            }
            TuiWidget::Divider => {
                let block = Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray));
                frame.render_widget(block, area);
            }
            TuiWidget::Button { primary } => {
                let mut style = highlight;
                if *primary {
                    style = style.add_modifier(Modifier::BOLD).fg(Color::Cyan);
                }
                let label = label_of(node);
                frame.render_widget(Paragraph::new(format!("[ {label} ]")).style(style), area);
            }
            TuiWidget::CheckBox { label, checked } => {
                let mark = if *checked { "x" } else { " " };
                frame.render_widget(
                    Paragraph::new(format!("[{mark}] {label}")).style(highlight),
                    area,
                );
            }
            TuiWidget::TextField {
                label,
                value,
                placeholder,
                ..
            } => {
                let input = self.inputs.entry(node.id.clone()).or_default();
                let props = TextInputProps {
                    value,
                    label,
                    placeholder,
                    is_focused: focused,
                };
                input.render(frame, area, props);
            }
            TuiWidget::Slider {
                label,
                value,
                min,
                max,
            } => {
                const BAR: usize = 20;
                let ratio = if max > min {
                    ((value - min) / (max - min)).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let filled = (ratio * BAR as f64).round() as usize;
                let bar = format!("{}{}", "=".repeat(filled), "-".repeat(BAR - filled));
                frame.render_widget(
                    Paragraph::new(format!("{label} [{bar}] {value}")).style(highlight),
                    area,
                );
            }
            TuiWidget::Choice {
                options,
                selected,
                max_selections,
            } => {
                let cursor = self.option_cursor.get(&node.id).copied().unwrap_or(0);
                let single = *max_selections == Some(1);
                let lines: Vec<Line> = options
                    .iter()
                    .enumerate()
                    .map(|(i, option)| {
                        let on = selected.contains(&option.value);
                        let mark = match (single, on) {
                            (true, true) => "(*)",
                            (true, false) => "( )",
                            (false, true) => "[x]",
                            (false, false) => "[ ]",
                        };
                        let style = if focused && i == cursor {
                            highlight
                        } else {
                            Style::default()
                        };
                        Line::styled(format!("{mark} {}", option.label), style)
                    })
                    .collect();
                frame.render_widget(Paragraph::new(lines), area);
            }
            TuiWidget::Stack { axis: Axis::Vertical } | TuiWidget::Modal => {
                self.draw_column(frame, area, node);
            }
            TuiWidget::Stack {
                axis: Axis::Horizontal,
            } => self.draw_row(frame, area, node),
            TuiWidget::Card => {
                let block = Block::default().borders(Borders::ALL);
                let inner = block.inner(area);
                frame.render_widget(block, area);
                self.draw_column(frame, inner, node);
            }
            TuiWidget::Tabs { titles } => {
                let active = self.tab_index(node);
                let style = if focused {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                };
                let tabs = ratatui::widgets::Tabs::new(titles.iter().map(String::as_str))
                    .select(active)
                    .style(style)
                    .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));
                frame.render_widget(tabs, Rect { height: 1, ..area });
                self.draw_column(frame, below(area, 1), node);
            }
            TuiWidget::Unknown { kind } => {
                let style = Style::default().fg(Color::DarkGray);
                frame.render_widget(
                    Paragraph::new(format!("<{kind}>")).style(style),
                    Rect { height: 1, ..area },
                );
                self.draw_column(frame, below(area, 1), node);
            }
        }
    }

    fn draw_column(&mut self, frame: &mut Frame, area: Rect, node: &Node) {
        let mut y = area.y;
        for child in self.visible_children(node) {
            if y >= area.bottom() {
                break;
            }
            let height = self.height_of(child).min(area.bottom() - y);
            self.draw(frame, Rect { y, height, ..area }, child);
            y += height;
        }
    }

    fn draw_row(&mut self, frame: &mut Frame, area: Rect, node: &Node) {
        let children = self.visible_children(node);
        if children.is_empty() {
            return;
        }
        let constraints = children.iter().map(|child| {
            let weight = child.weight.map(|w| w.round().max(1.0) as u16).unwrap_or(1);
            Constraint::Fill(weight)
        });
        let columns = Layout::horizontal(constraints).spacing(1).split(area);
        for (child, column) in children.into_iter().zip(columns.iter()) {
            self.draw(frame, *column, child);
        }
    }
}

impl Component<WidgetEvent> for SurfaceView {
    type Props<'a> = SurfaceViewProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = WidgetEvent> {
        let tree = props.tree;
        self.sync_focus(tree);

        let EventKind::Key(key) = event else {
            return None;
        };
        match key.code {
            KeyCode::Tab => {
                self.move_focus(tree, true);
                return None;
            }
            KeyCode::BackTab => {
                self.move_focus(tree, false);
                return None;
            }
            _ => {}
        }

        self.focused_event(tree, key.code, event)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        self.sync_focus(props.tree);
        match &props.tree.root {
            Some(RenderChild::Node(root)) => self.draw(frame, area, root),
            Some(RenderChild::Empty { id, .. }) => {
                let waiting = format!("waiting for `{id}`...");
                frame.render_widget(
                    Paragraph::new(waiting).style(Style::default().fg(Color::DarkGray)),
                    area,
                );
            }
            None => {
                frame.render_widget(
                    Paragraph::new("waiting for beginRendering...")
                        .style(Style::default().fg(Color::DarkGray)),
                    area,
                );
            }
        }
    }
}

/// Rows of `area` after the first `skip`.
fn below(area: Rect, skip: u16) -> Rect {
    let skip = skip.min(area.height);
    Rect {
        y: area.y + skip,
        height: area.height - skip,
        ..area
    }
}

/// Text of every `Text` in a subtree, joined by spaces.
fn label_of(node: &Node) -> String {
    let mut parts = Vec::new();
    node.walk(&mut |n, _| {
        if let TuiWidget::Text { text, .. } = &n.widget {
            if !text.is_empty() {
                parts.push(text.as_str());
            }
        }
    });
    parts.join(" ")
}

/// One slider step, a twentieth of the range, as the new value.
///
/// Whole-number ranges stay whole numbers.
fn slider_step(value: f64, min: f64, max: f64, direction: f64) -> Option<DataValue> {
    if max <= min {
        return None;
    }
    let integral = value.fract() == 0.0 && min.fract() == 0.0 && max.fract() == 0.0;
    let mut step = (max - min) / 20.0;
    if integral {
        step = step.round().max(1.0);
    }
    let next = (value + direction * step).clamp(min, max);
    if next == value {
        return None;
    }
    if integral {
        Some(DataValue::from(next as i64))
    } else {
        DataValue::from_f64(next)
    }
}

/// The new selection after picking `value`.
///
/// A single-choice list replaces its selection. Otherwise `value` toggles,
/// and picks beyond `max` are refused.
fn pick(selected: &[String], value: &str, max: Option<usize>) -> Option<Vec<String>> {
    if max == Some(1) {
        let unchanged = selected.len() == 1 && selected[0] == value;
        return (!unchanged).then(|| vec![value.to_string()]);
    }
    if selected.iter().any(|s| s == value) {
        return Some(selected.iter().filter(|s| *s != value).cloned().collect());
    }
    if max.is_some_and(|max| selected.len() >= max) {
        return None;
    }
    let mut next = selected.to_vec();
    next.push(value.to_string());
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_single_replaces() {
        let selected = vec!["a".to_string()];
        assert_eq!(pick(&selected, "b", Some(1)), Some(vec!["b".to_string()]));
        assert_eq!(pick(&selected, "a", Some(1)), None);
    }

    #[test]
    fn test_pick_multi_toggles_and_caps() {
        let selected = vec!["a".to_string(), "b".to_string()];
        assert_eq!(pick(&selected, "a", None), Some(vec!["b".to_string()]));
        assert_eq!(pick(&selected, "c", Some(2)), None);
        assert_eq!(
            pick(&selected, "c", Some(3)),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn test_slider_step() {
        assert_eq!(slider_step(50.0, 0.0, 100.0, 1.0), Some(DataValue::from(55)));
        assert_eq!(slider_step(100.0, 0.0, 100.0, 1.0), None);
        assert_eq!(slider_step(0.0, 0.0, 10.0, -1.0), None);
        let fine = slider_step(0.5, 0.0, 1.0, 1.0).and_then(|v| v.as_f64()).unwrap();
        assert!((fine - 0.55).abs() < 1e-9);
        assert_eq!(slider_step(1.0, 1.0, 1.0, 1.0), None);
    }

    #[test]
    fn test_below_clamps() {
        let area = Rect::new(0, 0, 10, 1);
        assert_eq!(below(area, 3).height, 0);
        assert_eq!(below(Rect::new(0, 2, 10, 5), 1), Rect::new(0, 3, 10, 4));
    }
}
