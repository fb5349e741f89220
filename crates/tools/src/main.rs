use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use compute::{Statistics, points_within};
use dashboard::{ErrorReport, MapConfig};
use formats::geojson::FeatureCollection;
use formats::submission::{submissions_from_json_str, to_point_collection};
use layers::filter::Filter;
use layers::layer::PaintProperty;
use layers::symbology::{
    Color, Domain, Expression, PaintValue, resolve_color_expression, resolve_radius_expression,
};
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline tools for the submissions map")]
struct Args {
    /// Map config JSON (defaults apply when omitted)
    #[arg(long, global = true, env = "PIECEWISE_MAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a submissions JSON array to a GeoJSON point collection
    Points {
        submissions: PathBuf,

        #[arg(long)]
        pretty: bool,
    },

    /// Count the submissions inside one geographic unit
    Within {
        submissions: PathBuf,

        /// GeoJSON FeatureCollection of geographic units
        boundaries: PathBuf,

        /// Identifier of the unit to query
        #[arg(long)]
        fips: String,

        /// Also report the mean of this metric over the matching points
        #[arg(long)]
        metric: Option<String>,
    },

    /// Print the paint expression for a metric encoding
    Paint {
        #[arg(long, value_enum)]
        kind: PaintKind,

        #[arg(long)]
        metric: Option<String>,

        /// Domain as MIN,MAX
        #[arg(long, default_value = "0,1", allow_hyphen_values = true)]
        domain: String,

        /// Range as LOW,HIGH (numbers for radius, colors for color)
        #[arg(long, allow_hyphen_values = true)]
        range: String,

        /// Derive the domain from the metric's values in this submissions file
        #[arg(long)]
        auto_domain: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PaintKind {
    Radius,
    Color,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            info!("loading map config from {}", path.display());
            MapConfig::load(path).map_err(|e| ErrorReport::from_error(&e).to_string())?
        }
        None => MapConfig::default(),
    };

    match args.command {
        Command::Points {
            submissions,
            pretty,
        } => cmd_points(&submissions, pretty),
        Command::Within {
            submissions,
            boundaries,
            fips,
            metric,
        } => cmd_within(&config, &submissions, &boundaries, &fips, metric.as_deref()),
        Command::Paint {
            kind,
            metric,
            domain,
            range,
            auto_domain,
        } => cmd_paint(&config, kind, metric.as_deref(), &domain, &range, auto_domain.as_deref()),
    }
}

fn load_points(path: &Path) -> Result<FeatureCollection, String> {
    let payload = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    let submissions =
        submissions_from_json_str(&payload).map_err(|e| ErrorReport::from_error(&e).to_string())?;
    if submissions.is_none() {
        warn!("{path:?} holds no data yet");
    }
    Ok(to_point_collection(submissions.as_deref()).unwrap_or_default())
}

fn cmd_points(path: &Path, pretty: bool) -> Result<(), String> {
    let points = load_points(path)?;
    info!("converted {} submissions", points.len());
    let out = if pretty {
        points.to_geojson_string_pretty()
    } else {
        points.to_geojson_string()
    };
    println!("{}", out.map_err(|e| e.to_string())?);
    Ok(())
}

fn cmd_within(
    config: &MapConfig,
    submissions: &Path,
    boundaries: &Path,
    fips: &str,
    metric: Option<&str>,
) -> Result<(), String> {
    let points = load_points(submissions)?;
    let payload =
        fs::read_to_string(boundaries).map_err(|e| format!("read {boundaries:?}: {e}"))?;
    let units = FeatureCollection::from_geojson_str(&payload).map_err(|e| e.to_string())?;

    let summary = within_summary(&config.feature_id_property, &points, &units, fips, metric)
        .ok_or_else(|| format!("no unit with {} = {fips} in {boundaries:?}", config.feature_id_property))?;
    println!("{summary}");
    Ok(())
}

/// Count (and optionally mean metric) of the points inside the unit whose
/// `id_property` is `fips`, plus the highlight filter that selects the unit.
fn within_summary(
    id_property: &str,
    points: &FeatureCollection,
    units: &FeatureCollection,
    fips: &str,
    metric: Option<&str>,
) -> Option<Value> {
    let unit = units
        .features
        .iter()
        .find(|f| f.property(id_property).is_some_and(|v| id_matches(v, fips)))?;
    let unit_id = unit.property(id_property)?.clone();

    let within = points_within(points, unit);
    debug!("{} of {} points inside {fips}", within.len(), points.len());

    let mut summary = json!({
        "count": within.len(),
        "filter": Filter::property_eq(id_property, unit_id.clone()).to_json(),
    });
    summary[id_property] = unit_id;
    if let Some(metric) = metric {
        let values = Statistics::metric_values(&within, metric);
        summary["metric"] = json!(metric);
        summary["mean"] = json!(Statistics::mean(&values));
    }
    Some(summary)
}

/// Unit ids may be stored as strings or numbers.
fn id_matches(value: &Value, wanted: &str) -> bool {
    match value {
        Value::String(s) => s == wanted,
        other => other.to_string() == wanted,
    }
}

fn cmd_paint(
    config: &MapConfig,
    kind: PaintKind,
    metric: Option<&str>,
    domain: &str,
    range: &str,
    auto_domain: Option<&Path>,
) -> Result<(), String> {
    let domain = match (auto_domain, metric) {
        (Some(path), Some(metric)) => {
            let points = load_points(path)?;
            let [min, max] = Statistics::metric_domain(&points, metric)
                .ok_or_else(|| format!("no {metric} values in {path:?}"))?;
            info!("domain of {metric}: {min}..{max}");
            Domain::new(min, max)
        }
        (Some(_), None) => return Err("--auto-domain requires --metric".to_string()),
        (None, _) => {
            let (min, max) = parse_pair(domain)?;
            let min: f64 = min.parse().map_err(|e| format!("domain {min:?}: {e}"))?;
            let max: f64 = max.parse().map_err(|e| format!("domain {max:?}: {e}"))?;
            Domain::new(min, max)
        }
    }
    .map_err(|e| e.to_string())?;

    let expression = match kind {
        PaintKind::Radius => {
            let (low, high) = parse_pair(range)?;
            let low: f64 = low.parse().map_err(|e| format!("range {low:?}: {e}"))?;
            let high: f64 = high.parse().map_err(|e| format!("range {high:?}: {e}"))?;
            resolve_radius_expression(metric, domain, [low, high], config.points.radius)
        }
        PaintKind::Color => {
            let metric = metric.ok_or("color paint requires --metric")?;
            let (low, high) = parse_pair(range)?;
            let low = Color::parse(low).map_err(|e| e.to_string())?;
            let high = Color::parse(high).map_err(|e| e.to_string())?;
            resolve_color_expression(
                metric,
                domain,
                [low.into(), high.into()],
                PaintValue::Color(config.fill.missing_color),
            )
        }
    };
    println!("{}", paint_json(kind, &expression));
    Ok(())
}

/// The paint property an encoding kind drives, with its value.
fn paint_json(kind: PaintKind, expression: &Expression) -> Value {
    let property = match kind {
        PaintKind::Radius => PaintProperty::CircleRadius,
        PaintKind::Color => PaintProperty::FillColor,
    };
    json!({ "property": property.as_str(), "value": expression.to_json() })
}

/// Splits `A,B` at the top-level comma, so `rgb(1,2,3),#fff` splits after
/// the closing parenthesis.
fn parse_pair(s: &str) -> Result<(&str, &str), String> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Ok((s[..i].trim(), s[i + 1..].trim())),
            _ => {}
        }
    }
    Err(format!("expected two comma-separated values, got {s:?}"))
}

#[cfg(test)]
mod tests {
    use super::{Args, Command, PaintKind, id_matches, paint_json, parse_pair, within_summary};
    use clap::Parser;
    use formats::geojson::{Feature, FeatureCollection, Geometry};
    use foundation::geo::LonLat;
    use layers::symbology::Expression;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};

    fn square(fips: &str, west: f64) -> Feature {
        let ring = vec![
            LonLat::new(west, 0.0),
            LonLat::new(west + 5.0, 0.0),
            LonLat::new(west + 5.0, 5.0),
            LonLat::new(west, 5.0),
            LonLat::new(west, 0.0),
        ];
        let mut props = Map::new();
        props.insert("fips".to_string(), json!(fips));
        Feature::new(Geometry::Polygon(vec![ring]), props)
    }

    fn point(download: f64, lon: f64) -> Feature {
        let mut props = Map::new();
        props.insert("actual_download".to_string(), json!(download));
        Feature::new(Geometry::Point(LonLat::new(lon, 1.0)), props)
    }

    #[test]
    fn negative_domain_is_not_a_flag() {
        let args = Args::try_parse_from([
            "piecewise", "paint", "--kind", "radius", "--domain", "-5,10", "--range", "2,20",
        ])
        .unwrap();
        let Command::Paint { domain, .. } = args.command else {
            panic!("expected paint");
        };
        assert_eq!(domain, "-5,10");
        assert_eq!(parse_pair(&domain), Ok(("-5", "10")));
    }

    #[test]
    fn summary_counts_points_and_names_highlight_filter() {
        let units = FeatureCollection::new(vec![square("A", 0.0), square("B", 5.0)]);
        let points = FeatureCollection::new(vec![point(10.0, 1.0), point(20.0, 6.0), point(40.0, 7.0)]);
        let summary =
            within_summary("fips", &points, &units, "B", Some("actual_download")).unwrap();
        assert_eq!(summary["count"], json!(2));
        assert_eq!(summary["fips"], json!("B"));
        assert_eq!(summary["mean"], json!(30.0));
        assert_eq!(summary["filter"], json!(["==", ["get", "fips"], "B"]));
        assert!(within_summary("fips", &points, &units, "Z", None).is_none());
    }

    #[test]
    fn paint_output_names_the_property() {
        let out = paint_json(PaintKind::Radius, &Expression::literal(4.0));
        assert_eq!(out, json!({ "property": "circle-radius", "value": 4.0 }));
    }

    #[test]
    fn pair_of_numbers() {
        assert_eq!(parse_pair("0, 100"), Ok(("0", "100")));
    }

    #[test]
    fn pair_of_colors_respects_parentheses() {
        assert_eq!(
            parse_pair("rgb(255,255,255),#0000ff"),
            Ok(("rgb(255,255,255)", "#0000ff"))
        );
    }

    #[test]
    fn pair_needs_comma() {
        assert!(parse_pair("100").is_err());
    }

    #[test]
    fn ids_match_strings_and_numbers() {
        assert!(id_matches(&json!("06001"), "06001"));
        assert!(id_matches(&json!(6001), "6001"));
        assert!(!id_matches(&json!("06001"), "6001"));
    }
}
