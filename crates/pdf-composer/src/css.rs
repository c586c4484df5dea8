//! The small slice of CSS the HTML box understands.
//!
//! Only type selectors are matched, and only the properties that change
//! sizes: `font-size`, `line-height` and `margin-bottom`. Everything else is
//! ignored without error.

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HtmlStyle {
    pub font_size: f32,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    /// Space after paragraphs, in points.
    pub paragraph_gap: f32,
    /// Font size of `pre` and `code`, relative to the body.
    pub code_scale: f32,
    /// Font size of `h1`..`h6`, relative to the body.
    pub heading_scale: [f32; 6],
}

impl Default for HtmlStyle {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            line_height: 1.2,
            paragraph_gap: 6.0,
            code_scale: 0.9,
            heading_scale: [1.5, 1.3, 1.15, 1.05, 1.0, 1.0],
        }
    }
}

impl HtmlStyle {
    pub(crate) fn parse(css: &str) -> Self {
        let mut style = Self::default();
        let rules = rules(&strip_comments(css));

        // Body first: em values elsewhere are relative to it.
        for (selectors, decls) in &rules {
            if !selectors.iter().any(|s| s == "body" || s == "html") {
                continue;
            }
            for (prop, value) in decls {
                match prop.as_str() {
                    "font-size" => {
                        if let Some(size) = length(value, style.font_size) {
                            style.font_size = size.max(1.0);
                        }
                    }
                    "line-height" => {
                        if let Some(factor) = line_height(value, style.font_size) {
                            style.line_height = factor.max(1.0);
                        }
                    }
                    _ => {}
                }
            }
        }

        let base = style.font_size;
        for (selectors, decls) in &rules {
            for selector in selectors {
                for (prop, value) in decls {
                    match (selector.as_str(), prop.as_str()) {
                        ("p", "margin-bottom") => {
                            if let Some(gap) = length(value, base) {
                                style.paragraph_gap = gap.max(0.0);
                            }
                        }
                        ("pre" | "code", "font-size") => {
                            if let Some(size) = length(value, base) {
                                style.code_scale = size / base;
                            }
                        }
                        (h, "font-size") if heading_level(h).is_some() => {
                            if let (Some(level), Some(size)) = (heading_level(h), length(value, base)) {
                                style.heading_scale[level - 1] = size / base;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        style
    }
}

pub(crate) fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

type Rule = (Vec<String>, Vec<(String, String)>);

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(open) = rest.find("/*") {
        out.push_str(&rest[..open]);
        match rest[open + 2..].find("*/") {
            Some(close) => rest = &rest[open + 2 + close + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

fn rules(css: &str) -> Vec<Rule> {
    let mut rules = Vec::new();
    let mut rest = css;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        let selectors = rest[..open]
            .split(',')
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        let decls = rest[open + 1..open + close]
            .split(';')
            .filter_map(|decl| {
                let (prop, value) = decl.split_once(':')?;
                Some((prop.trim().to_ascii_lowercase(), value.trim().to_ascii_lowercase()))
            })
            .collect();
        rules.push((selectors, decls));
        rest = &rest[open + close + 1..];
    }
    rules
}

/// A length in points. `em` is relative to `em_base`; `px` is 0.75pt.
fn length(value: &str, em_base: f32) -> Option<f32> {
    let value = value.trim_end_matches("!important").trim();
    let (number, factor) = if let Some(n) = value.strip_suffix("pt") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("px") {
        (n, 0.75)
    } else if let Some(n) = value.strip_suffix("rem") {
        (n, em_base)
    } else if let Some(n) = value.strip_suffix("em") {
        (n, em_base)
    } else if let Some(n) = value.strip_suffix('%') {
        (n, em_base / 100.0)
    } else {
        (value, 1.0)
    };
    number.trim().parse::<f32>().ok().map(|n| n * factor)
}

/// `line-height` as a factor: unitless values are factors already.
fn line_height(value: &str, font_size: f32) -> Option<f32> {
    let value = value.trim();
    if let Ok(factor) = value.parse::<f32>() {
        return Some(factor);
    }
    length(value, font_size).map(|points| points / font_size)
}
