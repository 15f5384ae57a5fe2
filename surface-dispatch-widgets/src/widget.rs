//! Terminal widgets for the standard component set

use surface_dispatch_core::{DataValue, WidgetContext, WidgetRegistry};

/// How a `Text` is meant to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextHint {
    #[default]
    Body,
    Heading,
    Caption,
}

impl TextHint {
    fn parse(hint: Option<&str>) -> Self {
        match hint {
            Some("h1" | "h2" | "h3" | "h4" | "h5") => Self::Heading,
            Some("caption") => Self::Caption,
            _ => Self::Body,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// One entry of a `MultipleChoice`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOption {
    pub label: String,
    pub value: String,
}

/// A component resolved for terminal drawing.
#[derive(Debug, Clone, PartialEq)]
pub enum TuiWidget {
    Text { text: String, hint: TextHint },
    Image { url: String },
    Icon { name: String },
    Divider,
    /// Label comes from the child subtree.
    Button { primary: bool },
    CheckBox { label: String, checked: bool },
    /// `TextField` and `DateTimeInput`. `submits` when Enter should press
    /// the component's action.
    TextField {
        label: String,
        value: String,
        placeholder: String,
        submits: bool,
    },
    Slider { label: String, value: f64, min: f64, max: f64 },
    Choice {
        options: Vec<ChoiceOption>,
        selected: Vec<String>,
        max_selections: Option<usize>,
    },
    Stack { axis: Axis },
    Card,
    Tabs { titles: Vec<String> },
    Modal,
    /// No factory for this type.
    Unknown { kind: String },
}

impl TuiWidget {
    pub fn is_text_entry(&self) -> bool {
        matches!(self, Self::TextField { .. })
    }
}

fn number(ctx: &WidgetContext<'_>, prop: &str, default: f64) -> f64 {
    ctx.value(prop)
        .and_then(DataValue::as_f64)
        .or_else(|| ctx.raw(prop).and_then(serde_json::Value::as_f64))
        .unwrap_or(default)
}

fn text(ctx: &WidgetContext<'_>) -> TuiWidget {
    let hint = if ctx.kind() == "Heading" {
        TextHint::Heading
    } else {
        TextHint::parse(ctx.raw_str("usageHint"))
    };
    TuiWidget::Text {
        text: ctx.text("text").into_owned(),
        hint,
    }
}

fn text_field(ctx: &WidgetContext<'_>) -> TuiWidget {
    let placeholder = match ctx.kind() {
        "DateTimeInput" => "YYYY-MM-DD HH:MM",
        _ => "",
    };
    TuiWidget::TextField {
        label: ctx.text("label").into_owned(),
        value: ctx.bound_value().map(ToString::to_string).unwrap_or_default(),
        placeholder: placeholder.to_string(),
        submits: ctx.action().is_some(),
    }
}

fn choice(ctx: &WidgetContext<'_>) -> TuiWidget {
    let options = ctx
        .raw("options")
        .and_then(serde_json::Value::as_array)
        .map(|options| {
            options
                .iter()
                .filter_map(|option| {
                    let value = option.get("value")?.as_str()?.to_string();
                    let label = option
                        .get("label")
                        .and_then(|label| ctx.resolve_raw(label))
                        .map(|label| label.to_string())
                        .unwrap_or_else(|| value.clone());
                    Some(ChoiceOption { label, value })
                })
                .collect()
        })
        .unwrap_or_default();
    let max_selections = ctx
        .raw("maxAllowedSelections")
        .and_then(serde_json::Value::as_u64)
        .map(|max| max as usize);

    TuiWidget::Choice {
        options,
        selected: ctx.list("selections").iter().map(ToString::to_string).collect(),
        max_selections,
    }
}

fn tabs(ctx: &WidgetContext<'_>) -> TuiWidget {
    let titles = ctx
        .raw("tabItems")
        .and_then(serde_json::Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.get("title")
                        .and_then(|title| ctx.resolve_raw(title))
                        .map(|title| title.to_string())
                        .unwrap_or_else(|| format!("Tab {}", i + 1))
                })
                .collect()
        })
        .unwrap_or_default();
    TuiWidget::Tabs { titles }
}

/// A registry covering the standard catalog. Anything else draws as
/// [`TuiWidget::Unknown`].
pub fn tui_registry() -> WidgetRegistry<TuiWidget> {
    WidgetRegistry::new(|ctx| TuiWidget::Unknown {
        kind: ctx.kind().to_string(),
    })
    .with("Text", text)
    .with("Heading", text)
    .with("Image", |ctx| TuiWidget::Image {
        url: ctx.text("url").into_owned(),
    })
    .with("Icon", |ctx| TuiWidget::Icon {
        name: ctx.text("name").into_owned(),
    })
    .with("Video", |ctx| TuiWidget::Image {
        url: ctx.text("url").into_owned(),
    })
    .with("AudioPlayer", |ctx| TuiWidget::Image {
        url: ctx.text("url").into_owned(),
    })
    .with("Divider", |_| TuiWidget::Divider)
    .with("Button", |ctx| TuiWidget::Button {
        primary: ctx.flag("primary")
            || ctx
                .raw("primary")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false),
    })
    .with("CheckBox", |ctx| TuiWidget::CheckBox {
        label: ctx.text("label").into_owned(),
        checked: ctx.flag("value"),
    })
    .with("TextField", text_field)
    .with("DateTimeInput", text_field)
    .with("Slider", |ctx| TuiWidget::Slider {
        label: ctx.text("label").into_owned(),
        value: number(ctx, "value", 0.0),
        min: number(ctx, "minValue", 0.0),
        max: number(ctx, "maxValue", 100.0),
    })
    .with("MultipleChoice", choice)
    .with("Row", |_| TuiWidget::Stack {
        axis: Axis::Horizontal,
    })
    .with("Column", |_| TuiWidget::Stack {
        axis: Axis::Vertical,
    })
    .with("List", |ctx| TuiWidget::Stack {
        axis: match ctx.raw_str("direction") {
            Some("horizontal") => Axis::Horizontal,
            _ => Axis::Vertical,
        },
    })
    .with("Card", |_| TuiWidget::Card)
    .with("Tabs", tabs)
    .with("Modal", |_| TuiWidget::Modal)
}
