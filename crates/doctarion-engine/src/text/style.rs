use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextStylePurpose {
    Quote,
    Emphasis,
    Subtle,
    InternalThinking,
    TechnicalTerm,
    Code,
    Unusual,
}

/// The effective style of a grapheme. `Default` is unstyled text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike_through: bool,
    pub purpose: Option<TextStylePurpose>,
    pub foreground_color: Option<String>,
    pub background_color: Option<String>,
}

impl TextStyle {
    pub fn is_default(&self) -> bool {
        *self == TextStyle::default()
    }

    pub fn apply_modifier(&mut self, modifier: &TextStyleModifier) {
        if let Some(v) = modifier.bold {
            self.bold = v;
        }
        if let Some(v) = modifier.italic {
            self.italic = v;
        }
        if let Some(v) = modifier.underline {
            self.underline = v;
        }
        if let Some(v) = modifier.strike_through {
            self.strike_through = v;
        }
        if let Some(v) = &modifier.purpose {
            self.purpose = *v;
        }
        if let Some(v) = &modifier.foreground_color {
            self.foreground_color = v.clone();
        }
        if let Some(v) = &modifier.background_color {
            self.background_color = v.clone();
        }
    }

    /// A modifier that turns this style back into the default style.
    pub fn modifier_to_reset_to_defaults(&self) -> TextStyleModifier {
        TextStyleModifier {
            bold: self.bold.then_some(false),
            italic: self.italic.then_some(false),
            underline: self.underline.then_some(false),
            strike_through: self.strike_through.then_some(false),
            purpose: self.purpose.map(|_| None),
            foreground_color: self.foreground_color.as_ref().map(|_| None),
            background_color: self.background_color.as_ref().map(|_| None),
        }
    }

    /// The smallest modifier that turns this style into `target`.
    pub fn difference_to(&self, target: &TextStyle) -> TextStyleModifier {
        fn changed<T: Clone + PartialEq>(from: &T, to: &T) -> Option<T> {
            (from != to).then(|| to.clone())
        }
        TextStyleModifier {
            bold: changed(&self.bold, &target.bold),
            italic: changed(&self.italic, &target.italic),
            underline: changed(&self.underline, &target.underline),
            strike_through: changed(&self.strike_through, &target.strike_through),
            purpose: changed(&self.purpose, &target.purpose),
            foreground_color: changed(&self.foreground_color, &target.foreground_color),
            background_color: changed(&self.background_color, &target.background_color),
        }
    }

    /// A modifier that, applied to the default style, yields this style.
    pub fn to_modifier(&self) -> TextStyleModifier {
        TextStyleModifier {
            bold: self.bold.then_some(true),
            italic: self.italic.then_some(true),
            underline: self.underline.then_some(true),
            strike_through: self.strike_through.then_some(true),
            purpose: self.purpose.map(Some),
            foreground_color: self.foreground_color.clone().map(Some),
            background_color: self.background_color.clone().map(Some),
        }
    }
}

/// A partial style.
///
/// For every property `None` means "leave as is". For flags `Some(false)`
/// unsets the property; for valued properties `Some(None)` does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStyleModifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike_through: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub purpose: Option<Option<TextStylePurpose>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub foreground_color: Option<Option<String>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub background_color: Option<Option<String>>,
}

// An explicit `null` means "unset", which must stay distinct from an absent key.
pub(crate) fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TextStyleModifier {
    pub fn is_empty(&self) -> bool {
        *self == TextStyleModifier::default()
    }

    pub fn bold() -> Self {
        TextStyleModifier {
            bold: Some(true),
            ..Default::default()
        }
    }

    pub fn italic() -> Self {
        TextStyleModifier {
            italic: Some(true),
            ..Default::default()
        }
    }

    /// Properties set in `other` win over the ones in `self`.
    pub fn merged_with(&self, other: &TextStyleModifier) -> TextStyleModifier {
        TextStyleModifier {
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            strike_through: other.strike_through.or(self.strike_through),
            purpose: other.purpose.or(self.purpose),
            foreground_color: other
                .foreground_color
                .clone()
                .or_else(|| self.foreground_color.clone()),
            background_color: other
                .background_color
                .clone()
                .or_else(|| self.background_color.clone()),
        }
    }
}

/// Compact form used in debug dumps, e.g. `+B,-I,FG=red`.
impl fmt::Display for TextStyleModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        for (flag, code) in [
            (self.bold, "B"),
            (self.italic, "I"),
            (self.underline, "U"),
            (self.strike_through, "S"),
        ] {
            match flag {
                Some(true) => parts.push(format!("+{code}")),
                Some(false) => parts.push(format!("-{code}")),
                None => {}
            }
        }
        match &self.purpose {
            Some(Some(p)) => parts.push(format!("P={p:?}")),
            Some(None) => parts.push("-P".to_string()),
            None => {}
        }
        for (color, code) in [
            (&self.foreground_color, "FG"),
            (&self.background_color, "BG"),
        ] {
            match color {
                Some(Some(c)) => parts.push(format!("{code}={c}")),
                Some(None) => parts.push(format!("-{code}")),
                None => {}
            }
        }
        f.write_str(&parts.join(","))
    }
}
