//! Flexbox style keywords and the container/item style structs.
//!
//! Keywords parse from both the CSS spelling (`space-between`) and the
//! toolkit's camel case (`spaceBetween`).

use std::fmt;
use std::str::FromStr;

use crate::geometry::Axis;

/// Unrecognised keyword for a flex property.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {property} keyword: `{value}`")]
pub struct KeywordError {
    pub property: &'static str,
    pub value: String,
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Declares a keyword enum with `FromStr`, `Display` and `as_str`.
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $property:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $css:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// CSS spelling of the keyword.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $css ),+
                }
            }
        }

        impl FromStr for $name {
            type Err = KeywordError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|k| normalize(k.as_str()) == wanted)
                    .ok_or_else(|| KeywordError {
                        property: $property,
                        value: s.to_owned(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

keyword_enum! {
    /// Main-axis direction and order of items.
    Direction, "flex-direction" {
        #[default]
        Row => "row",
        RowReverse => "row-reverse",
        Column => "column",
        ColumnReverse => "column-reverse",
    }
}

keyword_enum! {
    Wrap, "flex-wrap" {
        #[default]
        NoWrap => "nowrap",
        Wrap => "wrap",
        WrapReverse => "wrap-reverse",
    }
}

keyword_enum! {
    /// Distribution of leftover main-axis space among items.
    JustifyContent, "justify-content" {
        #[default]
        Start => "start",
        End => "end",
        Center => "center",
        SpaceBetween => "space-between",
        SpaceAround => "space-around",
        SpaceEvenly => "space-evenly",
    }
}

keyword_enum! {
    /// Distribution of leftover cross-axis space among flows.
    AlignContent, "align-content" {
        #[default]
        Start => "start",
        End => "end",
        Center => "center",
        SpaceBetween => "space-between",
        SpaceAround => "space-around",
        SpaceEvenly => "space-evenly",
        Stretch => "stretch",
    }
}

keyword_enum! {
    /// Cross-axis placement of items within their flow.
    AlignItems, "align-items" {
        #[default]
        Start => "start",
        End => "end",
        Center => "center",
        Baseline => "baseline",
        Stretch => "stretch",
    }
}

keyword_enum! {
    /// Per-item override of [`AlignItems`]; `Auto` defers to the container.
    AlignSelf, "align-self" {
        #[default]
        Auto => "auto",
        Start => "start",
        End => "end",
        Center => "center",
        Baseline => "baseline",
        Stretch => "stretch",
    }
}

impl Direction {
    pub fn main_axis(self) -> Axis {
        match self {
            Direction::Row | Direction::RowReverse => Axis::Horizontal,
            Direction::Column | Direction::ColumnReverse => Axis::Vertical,
        }
    }

    pub fn is_reverse(self) -> bool {
        matches!(self, Direction::RowReverse | Direction::ColumnReverse)
    }
}

impl AlignSelf {
    /// Effective alignment given the container's `align-items`.
    pub fn resolve(self, items: AlignItems) -> AlignItems {
        match self {
            AlignSelf::Auto => items,
            AlignSelf::Start => AlignItems::Start,
            AlignSelf::End => AlignItems::End,
            AlignSelf::Center => AlignItems::Center,
            AlignSelf::Baseline => AlignItems::Baseline,
            AlignSelf::Stretch => AlignItems::Stretch,
        }
    }
}

impl From<JustifyContent> for AlignContent {
    fn from(j: JustifyContent) -> Self {
        match j {
            JustifyContent::Start => AlignContent::Start,
            JustifyContent::End => AlignContent::End,
            JustifyContent::Center => AlignContent::Center,
            JustifyContent::SpaceBetween => AlignContent::SpaceBetween,
            JustifyContent::SpaceAround => AlignContent::SpaceAround,
            JustifyContent::SpaceEvenly => AlignContent::SpaceEvenly,
        }
    }
}

// ---------------------------------------------------------------------------
// Style structs
// ---------------------------------------------------------------------------

/// Container-side flexbox style.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlexStyle {
    pub direction: Direction,
    pub wrap: Wrap,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub align_content: AlignContent,
    /// Gap between flows of a row container, or items of a column container.
    pub row_gap: f64,
    /// Gap between items of a row container, or flows of a column container.
    pub column_gap: f64,
}

impl FlexStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn justify_content(mut self, justify: JustifyContent) -> Self {
        self.justify_content = justify;
        self
    }

    pub fn align_items(mut self, align: AlignItems) -> Self {
        self.align_items = align;
        self
    }

    pub fn align_content(mut self, align: AlignContent) -> Self {
        self.align_content = align;
        self
    }

    /// Negative gaps are clamped to zero.
    pub fn row_gap(mut self, gap: f64) -> Self {
        self.row_gap = gap.max(0.0);
        self
    }

    pub fn column_gap(mut self, gap: f64) -> Self {
        self.column_gap = gap.max(0.0);
        self
    }

    /// Set both gaps.
    pub fn gap(self, gap: f64) -> Self {
        self.row_gap(gap).column_gap(gap)
    }

    /// Gap between consecutive items of one flow.
    pub fn main_gap(&self) -> f64 {
        match self.direction.main_axis() {
            Axis::Horizontal => self.column_gap,
            Axis::Vertical => self.row_gap,
        }
    }

    /// Gap between consecutive flows.
    pub fn cross_gap(&self) -> f64 {
        match self.direction.main_axis() {
            Axis::Horizontal => self.row_gap,
            Axis::Vertical => self.column_gap,
        }
    }
}

/// Item-side flexbox style.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlexItemStyle {
    pub grow: f64,
    pub align_self: AlignSelf,
    /// Excluded from layout entirely.
    pub ignore_flex: bool,
}

impl FlexItemStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Negative and NaN values are clamped to zero.
    pub fn grow(mut self, grow: f64) -> Self {
        self.grow = clamp_grow(grow);
        self
    }

    pub fn align_self(mut self, align: AlignSelf) -> Self {
        self.align_self = align;
        self
    }

    pub fn ignore_flex(mut self, ignore: bool) -> Self {
        self.ignore_flex = ignore;
        self
    }
}

pub(crate) fn clamp_grow(grow: f64) -> f64 {
    if grow.is_nan() {
        0.0
    } else {
        grow.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let style = FlexStyle::default();
        assert_eq!(style.direction, Direction::Row);
        assert_eq!(style.wrap, Wrap::NoWrap);
        assert_eq!(style.justify_content, JustifyContent::Start);
        assert_eq!(style.align_items, AlignItems::Start);
        assert_eq!(style.align_content, AlignContent::Start);
        assert_eq!((style.row_gap, style.column_gap), (0.0, 0.0));
        assert_eq!(FlexItemStyle::default().align_self, AlignSelf::Auto);
    }

    #[test]
    fn keywords_parse_kebab_and_camel_case() {
        assert_eq!("space-between".parse::<JustifyContent>(), Ok(JustifyContent::SpaceBetween));
        assert_eq!("spaceBetween".parse::<JustifyContent>(), Ok(JustifyContent::SpaceBetween));
        assert_eq!("wrapReverse".parse::<Wrap>(), Ok(Wrap::WrapReverse));
        assert_eq!("column-reverse".parse::<Direction>(), Ok(Direction::ColumnReverse));
        assert_eq!("Stretch".parse::<AlignContent>(), Ok(AlignContent::Stretch));
    }

    #[test]
    fn keyword_errors_name_the_property() {
        let err = "sideways".parse::<Direction>().unwrap_err();
        assert_eq!(err.to_string(), "invalid flex-direction keyword: `sideways`");
        assert!("stretch".parse::<JustifyContent>().is_err());
    }

    #[test]
    fn display_uses_css_spelling() {
        assert_eq!(AlignContent::SpaceEvenly.to_string(), "space-evenly");
        assert_eq!(Wrap::NoWrap.to_string(), "nowrap");
    }

    #[test]
    fn gaps_follow_the_main_axis() {
        let row = FlexStyle::new().row_gap(2.0).column_gap(5.0);
        assert_eq!((row.main_gap(), row.cross_gap()), (5.0, 2.0));
        let column = row.direction(Direction::Column);
        assert_eq!((column.main_gap(), column.cross_gap()), (2.0, 5.0));
    }

    #[test]
    fn negative_values_are_clamped() {
        assert_eq!(FlexStyle::new().gap(-3.0).row_gap, 0.0);
        assert_eq!(FlexItemStyle::new().grow(-1.0).grow, 0.0);
        assert_eq!(FlexItemStyle::new().grow(f64::NAN).grow, 0.0);
    }

    #[test]
    fn align_self_resolution() {
        assert_eq!(AlignSelf::Auto.resolve(AlignItems::Center), AlignItems::Center);
        assert_eq!(AlignSelf::End.resolve(AlignItems::Center), AlignItems::End);
    }
}
