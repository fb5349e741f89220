//! Data-driven paint: colors, paint values, expressions and the resolvers that
//! turn a metric plus a domain/range pair into an expression.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Metrics that may drive point radius. Anything else draws at
/// [`DEFAULT_RADIUS`].
pub const RADIUS_METRICS: [&str; 4] = [
    "actual_download",
    "actual_upload",
    "advertised_download",
    "advertised_upload",
];

/// Constant radius for points without a radius metric.
pub const DEFAULT_RADIUS: f64 = 4.0;

/// Applied to the upper end of a radius range before it reaches the renderer.
///
/// Radius ranges are expressed in the legend's units, which are twice the
/// renderer's circle-radius units.
pub const RADIUS_RANGE_CORRECTION: f64 = 0.5;

#[derive(Debug, Error, PartialEq)]
pub enum EncodingError {
    #[error("domain must be ascending, got [{min}, {max}]")]
    InvertedDomain { min: f64, max: f64 },
    #[error("domain bounds must be finite")]
    NonFiniteDomain,
    #[error("invalid color: {0}")]
    InvalidColor(String),
}

/// RGBA color, 8-bit channels plus float alpha.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Accepts `#rgb`, `#rrggbb`, `rgb(r, g, b)`, `rgba(r, g, b, a)`, `white`
    /// and `black`.
    pub fn parse(s: &str) -> Result<Self, EncodingError> {
        let invalid = || EncodingError::InvalidColor(s.to_string());
        let t = s.trim();

        match t {
            "white" => return Ok(Color::WHITE),
            "black" => return Ok(Color::rgb(0, 0, 0)),
            _ => {}
        }

        if let Some(hex) = t.strip_prefix('#') {
            if !hex.is_ascii() {
                return Err(invalid());
            }
            let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| invalid());
            return match hex.len() {
                3 => {
                    let mut c = [0u8; 3];
                    for (i, ch) in hex.chars().enumerate() {
                        let v = channel(&ch.to_string())?;
                        c[i] = v * 17;
                    }
                    Ok(Color::rgb(c[0], c[1], c[2]))
                }
                6 => Ok(Color::rgb(
                    channel(&hex[0..2])?,
                    channel(&hex[2..4])?,
                    channel(&hex[4..6])?,
                )),
                _ => Err(invalid()),
            };
        }

        let (body, with_alpha) = if let Some(b) = t.strip_prefix("rgba(") {
            (b, true)
        } else if let Some(b) = t.strip_prefix("rgb(") {
            (b, false)
        } else {
            return Err(invalid());
        };
        let body = body.strip_suffix(')').ok_or_else(invalid)?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if with_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(invalid());
        }
        let channel = |p: &str| p.parse::<u8>().map_err(|_| invalid());
        let a = if with_alpha {
            parts[3].parse::<f32>().map_err(|_| invalid())?
        } else {
            1.0
        };
        Ok(Color {
            r: channel(parts[0])?,
            g: channel(parts[1])?,
            b: channel(parts[2])?,
            a,
        })
    }

    pub fn to_css(self) -> String {
        if self.a >= 1.0 {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }

    pub fn lerp(self, other: Color, t: f64) -> Color {
        let ch = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8;
        Color {
            r: ch(self.r, other.r),
            g: ch(self.g, other.g),
            b: ch(self.b, other.b),
            a: (self.a as f64 + (other.a as f64 - self.a as f64) * t) as f32,
        }
    }
}

impl TryFrom<String> for Color {
    type Error = EncodingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::parse(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_css()
    }
}

/// A constant paint value: a number (radius, opacity, width) or a color.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaintValue {
    Number(f64),
    Color(Color),
}

impl PaintValue {
    pub fn to_json(self) -> Value {
        match self {
            PaintValue::Number(n) => json!(n),
            PaintValue::Color(c) => Value::String(c.to_css()),
        }
    }

    pub fn as_number(self) -> Option<f64> {
        match self {
            PaintValue::Number(n) => Some(n),
            PaintValue::Color(_) => None,
        }
    }

    pub fn as_color(self) -> Option<Color> {
        match self {
            PaintValue::Color(c) => Some(c),
            PaintValue::Number(_) => None,
        }
    }

    fn lerp(self, other: PaintValue, t: f64) -> Option<PaintValue> {
        match (self, other) {
            (PaintValue::Number(a), PaintValue::Number(b)) => Some(PaintValue::Number(a + (b - a) * t)),
            (PaintValue::Color(a), PaintValue::Color(b)) => Some(PaintValue::Color(a.lerp(b, t))),
            _ => None,
        }
    }
}

impl From<f64> for PaintValue {
    fn from(n: f64) -> Self {
        PaintValue::Number(n)
    }
}

impl From<Color> for PaintValue {
    fn from(c: Color) -> Self {
        PaintValue::Color(c)
    }
}

/// Ascending `[min, max]` data interval.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Domain([f64; 2]);

impl Domain {
    pub fn new(min: f64, max: f64) -> Result<Self, EncodingError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(EncodingError::NonFiniteDomain);
        }
        if min > max {
            return Err(EncodingError::InvertedDomain { min, max });
        }
        Ok(Self([min, max]))
    }

    pub fn min(&self) -> f64 {
        self.0[0]
    }

    pub fn max(&self) -> f64 {
        self.0[1]
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self([0.0, 1.0])
    }
}

impl TryFrom<[f64; 2]> for Domain {
    type Error = EncodingError;

    fn try_from(v: [f64; 2]) -> Result<Self, Self::Error> {
        Domain::new(v[0], v[1])
    }
}

impl From<Domain> for [f64; 2] {
    fn from(d: Domain) -> Self {
        d.0
    }
}

/// Result of evaluating an [`Expression`] against feature properties.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Bool(bool),
    Paint(PaintValue),
    Json(Value),
}

impl Evaluated {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Evaluated::Paint(PaintValue::Number(n)) => Some(*n),
            Evaluated::Json(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Evaluated::Paint(PaintValue::Color(c)) => Some(*c),
            _ => None,
        }
    }
}

/// Declarative paint expression in the renderer's expression language.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(PaintValue),
    Get(String),
    Has(String),
    Case {
        condition: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
    /// Linear interpolation over ascending `(input, output)` stops, clamped
    /// outside the first and last stop.
    Interpolate {
        input: Box<Expression>,
        stops: Vec<(f64, PaintValue)>,
    },
}

impl Expression {
    pub fn literal(value: impl Into<PaintValue>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn case(condition: Expression, then: Expression, otherwise: Expression) -> Self {
        Expression::Case {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// Linear interpolation of `property` from `domain` onto `range`.
    ///
    /// A degenerate domain collapses to a single stop at `range[0]`.
    pub fn linear(property: &str, domain: Domain, range: [PaintValue; 2]) -> Self {
        let stops = if domain.min() == domain.max() {
            vec![(domain.min(), range[0])]
        } else {
            vec![(domain.min(), range[0]), (domain.max(), range[1])]
        };
        Expression::Interpolate {
            input: Box::new(Expression::Get(property.to_string())),
            stops,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Expression::Literal(v) => v.to_json(),
            Expression::Get(key) => json!(["get", key]),
            Expression::Has(key) => json!(["has", key]),
            Expression::Case {
                condition,
                then,
                otherwise,
            } => json!(["case", condition.to_json(), then.to_json(), otherwise.to_json()]),
            Expression::Interpolate { input, stops } => {
                let mut out = vec![json!("interpolate"), json!(["linear"]), input.to_json()];
                for (at, value) in stops {
                    out.push(json!(at));
                    out.push(value.to_json());
                }
                Value::Array(out)
            }
        }
    }

    /// Evaluates against one feature's properties. `None` means the
    /// expression has no value for this feature (missing or mistyped input).
    pub fn evaluate(&self, properties: &Map<String, Value>) -> Option<Evaluated> {
        match self {
            Expression::Literal(v) => Some(Evaluated::Paint(*v)),
            Expression::Get(key) => properties.get(key).cloned().map(Evaluated::Json),
            Expression::Has(key) => Some(Evaluated::Bool(properties.contains_key(key))),
            Expression::Case {
                condition,
                then,
                otherwise,
            } => match condition.evaluate(properties)? {
                Evaluated::Bool(true) => then.evaluate(properties),
                Evaluated::Bool(false) => otherwise.evaluate(properties),
                _ => None,
            },
            Expression::Interpolate { input, stops } => {
                let x = input.evaluate(properties)?.as_number()?;
                interpolate_stops(stops, x).map(Evaluated::Paint)
            }
        }
    }
}

fn interpolate_stops(stops: &[(f64, PaintValue)], x: f64) -> Option<PaintValue> {
    let (first_at, first) = *stops.first()?;
    if x <= first_at {
        return Some(first);
    }
    for pair in stops.windows(2) {
        let (a_at, a) = pair[0];
        let (b_at, b) = pair[1];
        if x <= b_at {
            let t = (x - a_at) / (b_at - a_at);
            return a.lerp(b, t);
        }
    }
    stops.last().map(|(_, v)| *v)
}

/// Polygon fill color for `metric`: interpolated where the feature has the
/// metric, `missing` where it doesn't.
pub fn resolve_color_expression(
    metric: &str,
    domain: Domain,
    range: [PaintValue; 2],
    missing: PaintValue,
) -> Expression {
    Expression::case(
        Expression::Has(metric.to_string()),
        Expression::linear(metric, domain, range),
        Expression::Literal(missing),
    )
}

/// Point radius for `metric`.
///
/// Only [`RADIUS_METRICS`] are interpolated; any other metric (or none) gives
/// the constant [`DEFAULT_RADIUS`]. The upper range bound is scaled by
/// [`RADIUS_RANGE_CORRECTION`]. Features without the metric get `missing`.
pub fn resolve_radius_expression(
    metric: Option<&str>,
    domain: Domain,
    range: [f64; 2],
    missing: f64,
) -> Expression {
    let Some(metric) = metric.filter(|m| RADIUS_METRICS.contains(m)) else {
        return Expression::literal(DEFAULT_RADIUS);
    };
    let range = [
        PaintValue::Number(range[0]),
        PaintValue::Number(range[1] * RADIUS_RANGE_CORRECTION),
    ];
    Expression::case(
        Expression::Has(metric.to_string()),
        Expression::linear(metric, domain, range),
        Expression::literal(missing),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn props(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn radius_at(expr: &Expression, value: f64) -> f64 {
        expr.evaluate(&props(&[("actual_download", json!(value))]))
            .and_then(|e| e.as_number())
            .expect("numeric radius")
    }

    #[test]
    fn radius_interpolates_with_halved_upper_bound() {
        let domain = Domain::new(0.0, 100.0).unwrap();
        let expr = resolve_radius_expression(Some("actual_download"), domain, [2.0, 20.0], DEFAULT_RADIUS);
        assert_eq!(radius_at(&expr, 0.0), 2.0);
        assert_eq!(radius_at(&expr, 100.0), 10.0);
        assert_eq!(radius_at(&expr, 50.0), 6.0);
    }

    #[test]
    fn radius_clamps_outside_domain() {
        let domain = Domain::new(0.0, 100.0).unwrap();
        let expr = resolve_radius_expression(Some("actual_download"), domain, [2.0, 20.0], DEFAULT_RADIUS);
        assert_eq!(radius_at(&expr, -5.0), 2.0);
        assert_eq!(radius_at(&expr, 500.0), 10.0);
    }

    #[test]
    fn radius_for_unlisted_metric_is_constant() {
        let domain = Domain::new(0.0, 100.0).unwrap();
        for metric in [Some("min_rtt"), Some("cost_of_service"), None] {
            let expr = resolve_radius_expression(metric, domain, [2.0, 20.0], 3.0);
            assert_eq!(expr, Expression::literal(4.0));
            assert_eq!(expr.to_json(), json!(4.0));
        }
    }

    #[test]
    fn radius_falls_back_when_metric_missing_on_feature() {
        let domain = Domain::new(0.0, 100.0).unwrap();
        let expr = resolve_radius_expression(Some("actual_upload"), domain, [2.0, 20.0], 4.0);
        let got = expr.evaluate(&props(&[("actual_download", json!(50.0))]));
        assert_eq!(got.and_then(|e| e.as_number()), Some(4.0));
    }

    #[test]
    fn radius_expression_json_shape() {
        let domain = Domain::new(0.0, 100.0).unwrap();
        let expr = resolve_radius_expression(Some("actual_download"), domain, [2.0, 20.0], 4.0);
        assert_eq!(
            expr.to_json(),
            json!([
                "case",
                ["has", "actual_download"],
                ["interpolate", ["linear"], ["get", "actual_download"], 0.0, 2.0, 100.0, 10.0],
                4.0
            ])
        );
    }

    #[test]
    fn color_interpolates_between_range_colors() {
        let domain = Domain::new(0.0, 10.0).unwrap();
        let range = [
            PaintValue::Color(Color::rgb(0, 0, 0)),
            PaintValue::Color(Color::rgb(200, 100, 50)),
        ];
        let expr = resolve_color_expression("median_download", domain, range, Color::WHITE.into());

        let mid = expr
            .evaluate(&props(&[("median_download", json!(5))]))
            .and_then(|e| e.as_color());
        assert_eq!(mid, Some(Color::rgb(100, 50, 25)));

        let missing = expr.evaluate(&Map::new()).and_then(|e| e.as_color());
        assert_eq!(missing, Some(Color::WHITE));
    }

    #[test]
    fn degenerate_domain_gives_lower_range_value() {
        let domain = Domain::new(5.0, 5.0).unwrap();
        let expr = Expression::linear("x", domain, [1.0.into(), 9.0.into()]);
        let got = expr.evaluate(&props(&[("x", json!(7.0))])).and_then(|e| e.as_number());
        assert_eq!(got, Some(1.0));
    }

    #[test]
    fn inverted_domain_is_rejected() {
        assert_eq!(
            Domain::new(10.0, 0.0),
            Err(EncodingError::InvertedDomain { min: 10.0, max: 0.0 })
        );
        assert_eq!(Domain::new(f64::NAN, 1.0), Err(EncodingError::NonFiniteDomain));
        assert!(serde_json::from_str::<Domain>("[3, 1]").is_err());
        assert_eq!(serde_json::from_str::<Domain>("[1, 3]").unwrap().max(), 3.0);
    }

    #[test]
    fn color_parsing() {
        assert_eq!(Color::parse("#ECE1CB").unwrap(), Color::rgb(0xEC, 0xE1, 0xCB));
        assert_eq!(Color::parse("#fff").unwrap(), Color::WHITE);
        assert_eq!(Color::parse("rgb(94, 66, 166)").unwrap(), Color::rgb(94, 66, 166));
        let translucent = Color::parse("rgba(10, 20, 30, 0.5)").unwrap();
        assert_eq!(translucent.a, 0.5);
        assert_eq!(translucent.to_css(), "rgba(10, 20, 30, 0.5)");
        assert!(Color::parse("#12345").is_err());
        assert!(Color::parse("hsl(1, 2%, 3%)").is_err());
    }

    #[test]
    fn paint_values_deserialize_from_numbers_and_colors() {
        let v: [PaintValue; 2] = serde_json::from_str(r##"["#000000", "white"]"##).unwrap();
        assert_eq!(v[1], PaintValue::Color(Color::WHITE));
        let n: PaintValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(n, PaintValue::Number(2.5));
    }
}
