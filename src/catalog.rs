//! The immutable template catalog.
//!
//! Every query the engine can render is declared here: name, parameter
//! specs, and a SQL body with `{slot}` markers. The catalog is built once at
//! first use and never mutated. Scalar slots render as `?` placeholders;
//! condition slots render as predicate fragments or the empty string.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;
use strsim::levenshtein;

use crate::coerce::FieldKind;
use crate::condition::{Binding, CondOp};
use crate::lookup::{all_venues, grades, nar_venues};
use crate::value::BindValue;

/// Declaration of a single template parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    /// JSON-facing type tag shown to callers ("int" or "str").
    pub ty: &'static str,
    pub required: bool,
    pub description: &'static str,
    pub default: Option<BindValue>,
    pub binding: Binding,
}

impl ParamSpec {
    fn required(
        name: &'static str,
        ty: &'static str,
        description: &'static str,
        binding: Binding,
    ) -> Self {
        Self {
            name,
            ty,
            required: true,
            description,
            default: None,
            binding,
        }
    }

    fn optional(
        name: &'static str,
        ty: &'static str,
        description: &'static str,
        binding: Binding,
    ) -> Self {
        Self {
            name,
            ty,
            required: false,
            description,
            default: None,
            binding,
        }
    }

    fn with_default(mut self, value: i64) -> Self {
        self.default = Some(BindValue::Int(value));
        self
    }

    /// The slot this parameter fills in the template body.
    pub fn slot(&self) -> &'static str {
        self.binding.slot_name(self.name)
    }
}

/// A named, parameterized SQL statement skeleton.
#[derive(Debug, Clone)]
pub struct TemplateDef {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
    pub sql: &'static str,
}

impl TemplateDef {
    /// Find a declared parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// Caller-facing description of one parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParamInfo {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub ty: &'static str,
    pub required: bool,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<BindValue>,
}

/// Caller-facing summary of one template, as returned by [`list_templates`].
#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParamInfo>,
}

/// Full template introspection, including the SQL body.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParamInfo>,
    pub sql: &'static str,
}

fn param_info(spec: &ParamSpec) -> ParamInfo {
    ParamInfo {
        name: spec.name,
        ty: spec.ty,
        required: spec.required,
        description: spec.description,
        default: spec.default.clone(),
    }
}

/// Registry of all templates, in definition order, with O(1) name lookup.
#[derive(Debug)]
pub struct Catalog {
    templates: Vec<TemplateDef>,
    index: HashMap<&'static str, usize>,
}

impl Catalog {
    fn new(templates: Vec<TemplateDef>) -> Self {
        let index = templates
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name, i))
            .collect();
        Self { templates, index }
    }

    /// Fetch a template definition by name.
    pub fn get(&self, name: &str) -> Option<&TemplateDef> {
        self.index.get(name).map(|&i| &self.templates[i])
    }

    /// All template names, in definition order.
    pub fn names(&self) -> Vec<String> {
        self.templates.iter().map(|t| t.name.to_string()).collect()
    }

    /// Summaries for every template, in definition order.
    pub fn list(&self) -> Vec<TemplateSummary> {
        self.templates
            .iter()
            .map(|t| TemplateSummary {
                name: t.name,
                description: t.description,
                parameters: t.params.iter().map(param_info).collect(),
            })
            .collect()
    }

    /// Full introspection for one template, if it exists.
    pub fn template_info(&self, name: &str) -> Option<TemplateInfo> {
        self.get(name).map(|t| TemplateInfo {
            name: t.name,
            description: t.description,
            parameters: t.params.iter().map(param_info).collect(),
            sql: t.sql,
        })
    }

    /// Closest template name within a Levenshtein threshold.
    pub fn suggest(&self, input: &str) -> Option<String> {
        let mut best_match = None;
        let mut min_dist = usize::MAX;

        for t in &self.templates {
            let dist = levenshtein(input, t.name);
            let threshold = match input.len() {
                0..=2 => 0,
                3..=5 => 2,
                _ => 3,
            };
            if dist <= threshold && dist < min_dist {
                min_dist = dist;
                best_match = Some(t.name.to_string());
            }
        }

        best_match
    }
}

static CATALOG: LazyLock<Catalog> = LazyLock::new(build_catalog);

/// Shared reference to the process-wide catalog.
pub fn catalog() -> &'static Catalog {
    LazyLock::force(&CATALOG)
}

/// Summaries for every template, in definition order.
pub fn list_templates() -> Vec<TemplateSummary> {
    catalog().list()
}

/// Full introspection for one template, if it exists.
pub fn get_template_info(name: &str) -> Option<TemplateInfo> {
    catalog().template_info(name)
}

// Condition bindings shared across templates.

fn venue_eq() -> Binding {
    Binding::Condition {
        slot: "venue_condition",
        column: "JyoCD",
        op: CondOp::Eq,
        kind: FieldKind::Lookup(all_venues()),
    }
}

fn nar_venue_eq() -> Binding {
    Binding::Condition {
        slot: "venue_condition",
        column: "JyoCD",
        op: CondOp::Eq,
        kind: FieldKind::Lookup(nar_venues()),
    }
}

fn year_eq() -> Binding {
    Binding::Condition {
        slot: "year_condition",
        column: "Year",
        op: CondOp::Eq,
        kind: FieldKind::Integer,
    }
}

fn year_from() -> Binding {
    Binding::Condition {
        slot: "year_condition",
        column: "Year",
        op: CondOp::Ge,
        kind: FieldKind::Integer,
    }
}

fn jockey_like() -> Binding {
    Binding::Condition {
        slot: "jockey_condition",
        column: "KisyuRyakusyo",
        op: CondOp::Like,
        kind: FieldKind::LikePattern,
    }
}

fn grade_eq() -> Binding {
    Binding::Condition {
        slot: "grade_condition",
        column: "r.GradeCD",
        op: CondOp::Eq,
        kind: FieldKind::Lookup(grades()),
    }
}

fn build_catalog() -> Catalog {
    Catalog::new(vec![
        TemplateDef {
            name: "favorite_win_rate",
            description: "Win rate by popularity rank",
            params: vec![
                ParamSpec::required(
                    "ninki",
                    "int",
                    "popularity rank (1-18)",
                    Binding::Scalar(FieldKind::Integer),
                ),
                ParamSpec::optional(
                    "venue",
                    "str",
                    "venue name (札幌, 函館, 福島, 新潟, 東京, 中山, 中京, 京都, 阪神, 小倉)",
                    venue_eq(),
                ),
                ParamSpec::optional("year_from", "str", "first year to include (YYYY)", year_from()),
            ],
            sql: r"
SELECT
    COUNT(*) as total_races,
    SUM(CASE WHEN KakuteiJyuni = 1 THEN 1 ELSE 0 END) as wins,
    SUM(CASE WHEN KakuteiJyuni <= 3 THEN 1 ELSE 0 END) as top3,
    ROUND(100.0 * SUM(CASE WHEN KakuteiJyuni = 1 THEN 1 ELSE 0 END) / COUNT(*), 1) as win_rate,
    ROUND(100.0 * SUM(CASE WHEN KakuteiJyuni <= 3 THEN 1 ELSE 0 END) / COUNT(*), 1) as top3_rate
FROM NL_SE
WHERE Ninki = {ninki}
  {venue_condition}
  {year_condition}
  AND KakuteiJyuni IS NOT NULL
  AND KakuteiJyuni > 0
",
        },
        TemplateDef {
            name: "jockey_stats",
            description: "Aggregate jockey results",
            params: vec![
                ParamSpec::optional(
                    "jockey_name",
                    "str",
                    "jockey name (substring match)",
                    jockey_like(),
                ),
                ParamSpec::optional("year", "str", "target year (YYYY)", year_eq()),
                ParamSpec::optional(
                    "limit",
                    "int",
                    "number of rows to return",
                    Binding::Scalar(FieldKind::Integer),
                )
                .with_default(20),
            ],
            sql: r"
SELECT
    KisyuRyakusyo as jockey_name,
    COUNT(*) as total_rides,
    SUM(CASE WHEN KakuteiJyuni = 1 THEN 1 ELSE 0 END) as wins,
    SUM(CASE WHEN KakuteiJyuni <= 2 THEN 1 ELSE 0 END) as top2,
    SUM(CASE WHEN KakuteiJyuni <= 3 THEN 1 ELSE 0 END) as top3,
    ROUND(100.0 * SUM(CASE WHEN KakuteiJyuni = 1 THEN 1 ELSE 0 END) / COUNT(*), 1) as win_rate,
    ROUND(100.0 * SUM(CASE WHEN KakuteiJyuni <= 3 THEN 1 ELSE 0 END) / COUNT(*), 1) as top3_rate
FROM NL_SE
WHERE KakuteiJyuni IS NOT NULL
  AND KakuteiJyuni > 0
  {jockey_condition}
  {year_condition}
GROUP BY KisyuRyakusyo
ORDER BY wins DESC, win_rate DESC
LIMIT {limit}
",
        },
        TemplateDef {
            name: "frame_stats",
            description: "Aggregate results by frame number",
            params: vec![
                ParamSpec::optional("venue", "str", "venue name", venue_eq()),
                ParamSpec::optional(
                    "kyori",
                    "str",
                    "distance in meters (e.g. 1600)",
                    Binding::Condition {
                        slot: "kyori_condition",
                        column: "Kyori",
                        op: CondOp::Eq,
                        kind: FieldKind::Integer,
                    },
                ),
            ],
            sql: r"
SELECT
    Wakuban as frame_number,
    COUNT(*) as total_runs,
    SUM(CASE WHEN KakuteiJyuni = 1 THEN 1 ELSE 0 END) as wins,
    SUM(CASE WHEN KakuteiJyuni <= 3 THEN 1 ELSE 0 END) as top3,
    ROUND(100.0 * SUM(CASE WHEN KakuteiJyuni = 1 THEN 1 ELSE 0 END) / COUNT(*), 1) as win_rate,
    ROUND(100.0 * SUM(CASE WHEN KakuteiJyuni <= 3 THEN 1 ELSE 0 END) / COUNT(*), 1) as top3_rate
FROM NL_SE
WHERE KakuteiJyuni IS NOT NULL
  AND KakuteiJyuni > 0
  {venue_condition}
  {kyori_condition}
GROUP BY Wakuban
ORDER BY Wakuban
",
        },
        TemplateDef {
            name: "race_result",
            description: "Race results joined with race information",
            params: vec![
                ParamSpec::required(
                    "year",
                    "str",
                    "year of the meeting (YYYY)",
                    Binding::Scalar(FieldKind::Integer),
                ),
                ParamSpec::required(
                    "month_day",
                    "str",
                    "month and day of the meeting (MMDD)",
                    Binding::Scalar(FieldKind::ZeroPadded(4)),
                ),
                ParamSpec::required(
                    "jyo_cd",
                    "str",
                    "venue code (01-10)",
                    Binding::Scalar(FieldKind::ZeroPadded(2)),
                ),
                ParamSpec::required(
                    "kaiji",
                    "str",
                    "meeting number within the year",
                    Binding::Scalar(FieldKind::Integer),
                ),
                ParamSpec::required(
                    "nichiji",
                    "str",
                    "day number within the meeting",
                    Binding::Scalar(FieldKind::Integer),
                ),
                ParamSpec::required(
                    "race_num",
                    "str",
                    "race number (1-12)",
                    Binding::Scalar(FieldKind::Integer),
                ),
            ],
            sql: r"
SELECT
    r.Hondai as race_name,
    r.GradeCD as grade,
    r.Kyori as distance,
    r.TrackCD as track_code,
    s.KakuteiJyuni as finish_position,
    s.Wakuban as frame_number,
    s.Umaban as horse_number,
    s.Bamei as horse_name,
    s.KisyuRyakusyo as jockey_name,
    s.Ninki as popularity,
    s.Odds as odds,
    s.Time as time,
    s.HaronTimeL3 as last_3f,
    s.BaTaijyu as weight
FROM NL_RA r
JOIN NL_SE s
  ON r.Year = s.Year
  AND r.MonthDay = s.MonthDay
  AND r.JyoCD = s.JyoCD
  AND r.Kaiji = s.Kaiji
  AND r.Nichiji = s.Nichiji
  AND r.RaceNum = s.RaceNum
WHERE r.Year = {year}
  AND r.MonthDay = {month_day}
  AND r.JyoCD = {jyo_cd}
  AND r.Kaiji = {kaiji}
  AND r.Nichiji = {nichiji}
  AND r.RaceNum = {race_num}
ORDER BY CAST(s.KakuteiJyuni AS INTEGER)
",
        },
        TemplateDef {
            name: "grade_race_list",
            description: "List graded races",
            params: vec![
                ParamSpec::optional("grade", "str", "grade (G1, G2, G3, リステッド)", grade_eq()),
                ParamSpec::optional("year", "str", "target year (YYYY)", year_eq()),
                ParamSpec::optional("venue", "str", "venue name", venue_eq()),
                ParamSpec::optional(
                    "limit",
                    "int",
                    "number of rows to return",
                    Binding::Scalar(FieldKind::Integer),
                )
                .with_default(50),
            ],
            sql: r"
SELECT
    r.Year as year,
    r.MonthDay as month_day,
    r.JyoCD as venue_code,
    r.Hondai as race_name,
    r.GradeCD as grade,
    r.Kyori as distance,
    r.TrackCD as track_code,
    r.SyussoTosu as horse_count
FROM NL_RA r
WHERE r.GradeCD IN ('A', 'B', 'C', 'D')
  {grade_condition}
  {year_condition}
  {venue_condition}
ORDER BY r.Year DESC, r.MonthDay DESC
LIMIT {limit}
",
        },
        TemplateDef {
            name: "horse_pedigree",
            description: "Pedigree information for a horse",
            params: vec![ParamSpec::required(
                "horse_name",
                "str",
                "horse name (substring match)",
                Binding::Scalar(FieldKind::LikePattern),
            )],
            sql: r"
SELECT
    u.Bamei as horse_name,
    u.KettoNum as ketto_num,
    u.SexCD as sex_code,
    u.BirthDate as birth_date,
    u.Ketto3InfoBamei1 as sire,
    u.Ketto3InfoBamei2 as dam,
    u.Ketto3InfoBamei5 as broodmare_sire,
    u.SanchiName as birthplace,
    u.BreederName as breeder,
    u.BanusiName as owner
FROM NL_UM u
WHERE u.Bamei LIKE {horse_name}
ORDER BY u.Bamei
LIMIT 20
",
        },
        TemplateDef {
            name: "sire_stats",
            description: "Aggregate results by sire",
            params: vec![
                ParamSpec::optional(
                    "sire_name",
                    "str",
                    "sire name (substring match)",
                    Binding::Condition {
                        slot: "sire_condition",
                        column: "s.Bamei1",
                        op: CondOp::Like,
                        kind: FieldKind::LikePattern,
                    },
                ),
                ParamSpec::optional("year", "str", "target year (YYYY)", year_eq()),
                ParamSpec::optional(
                    "limit",
                    "int",
                    "number of rows to return",
                    Binding::Scalar(FieldKind::Integer),
                )
                .with_default(20),
            ],
            sql: r"
SELECT
    s.Bamei1 as sire_name,
    COUNT(*) as total_runs,
    SUM(CASE WHEN s.KakuteiJyuni = 1 THEN 1 ELSE 0 END) as wins,
    SUM(CASE WHEN s.KakuteiJyuni <= 3 THEN 1 ELSE 0 END) as top3,
    ROUND(100.0 * SUM(CASE WHEN s.KakuteiJyuni = 1 THEN 1 ELSE 0 END) / COUNT(*), 1) as win_rate,
    ROUND(100.0 * SUM(CASE WHEN s.KakuteiJyuni <= 3 THEN 1 ELSE 0 END) / COUNT(*), 1) as top3_rate
FROM NL_SE s
WHERE s.KakuteiJyuni IS NOT NULL
  AND s.KakuteiJyuni > 0
  AND s.Bamei1 IS NOT NULL
  AND LENGTH(s.Bamei1) > 0
  {sire_condition}
  {year_condition}
GROUP BY s.Bamei1
HAVING COUNT(*) >= 10
ORDER BY wins DESC, win_rate DESC
LIMIT {limit}
",
        },
        TemplateDef {
            name: "nar_favorite_win_rate",
            description: "NAR win rate by popularity rank",
            params: vec![
                ParamSpec::required(
                    "ninki",
                    "int",
                    "popularity rank (1-18)",
                    Binding::Scalar(FieldKind::Integer),
                ),
                ParamSpec::optional(
                    "venue",
                    "str",
                    "NAR venue name (大井, 船橋, 川崎, 浦和, 名古屋, 園田, ...)",
                    nar_venue_eq(),
                ),
                ParamSpec::optional("year_from", "str", "first year to include (YYYY)", year_from()),
            ],
            sql: r"
SELECT
    COUNT(*) as total_races,
    SUM(CASE WHEN KakuteiJyuni = 1 THEN 1 ELSE 0 END) as wins,
    SUM(CASE WHEN KakuteiJyuni <= 3 THEN 1 ELSE 0 END) as top3,
    ROUND(100.0 * SUM(CASE WHEN KakuteiJyuni = 1 THEN 1 ELSE 0 END) / COUNT(*), 1) as win_rate,
    ROUND(100.0 * SUM(CASE WHEN KakuteiJyuni <= 3 THEN 1 ELSE 0 END) / COUNT(*), 1) as top3_rate
FROM NL_SE_NAR
WHERE Ninki = {ninki}
  {venue_condition}
  {year_condition}
  AND KakuteiJyuni IS NOT NULL
  AND KakuteiJyuni > 0
",
        },
        TemplateDef {
            name: "nar_jockey_stats",
            description: "NAR aggregate jockey results",
            params: vec![
                ParamSpec::optional(
                    "jockey_name",
                    "str",
                    "jockey name (substring match)",
                    jockey_like(),
                ),
                ParamSpec::optional("year", "str", "target year (YYYY)", year_eq()),
                ParamSpec::optional(
                    "limit",
                    "int",
                    "number of rows to return",
                    Binding::Scalar(FieldKind::Integer),
                )
                .with_default(20),
            ],
            sql: r"
SELECT
    KisyuRyakusyo as jockey_name,
    COUNT(*) as total_rides,
    SUM(CASE WHEN KakuteiJyuni = 1 THEN 1 ELSE 0 END) as wins,
    SUM(CASE WHEN KakuteiJyuni <= 3 THEN 1 ELSE 0 END) as top3,
    ROUND(100.0 * SUM(CASE WHEN KakuteiJyuni = 1 THEN 1 ELSE 0 END) / COUNT(*), 1) as win_rate,
    ROUND(100.0 * SUM(CASE WHEN KakuteiJyuni <= 3 THEN 1 ELSE 0 END) / COUNT(*), 1) as top3_rate
FROM NL_SE_NAR
WHERE KakuteiJyuni IS NOT NULL AND KakuteiJyuni > 0
  {jockey_condition}
  {year_condition}
GROUP BY KisyuRyakusyo
ORDER BY wins DESC, win_rate DESC
LIMIT {limit}
",
        },
        TemplateDef {
            name: "nar_venue_stats",
            description: "NAR first-favorite results by venue",
            params: vec![ParamSpec::optional(
                "year_from",
                "str",
                "first year to include (YYYY)",
                year_from(),
            )],
            sql: r"
SELECT
    JyoCD as venue_code,
    COUNT(*) as total_races,
    SUM(CASE WHEN KakuteiJyuni = 1 THEN 1 ELSE 0 END) as wins,
    ROUND(100.0 * SUM(CASE WHEN KakuteiJyuni = 1 THEN 1 ELSE 0 END) / COUNT(*), 1) as win_rate
FROM NL_SE_NAR
WHERE Ninki = 1 AND KakuteiJyuni IS NOT NULL AND KakuteiJyuni > 0
  {year_condition}
GROUP BY JyoCD
ORDER BY win_rate DESC
",
        },
        TemplateDef {
            name: "track_condition_stats",
            description: "Results by track condition for a horse",
            params: vec![ParamSpec::required(
                "horse_name",
                "str",
                "horse name (substring match)",
                Binding::Scalar(FieldKind::LikePattern),
            )],
            sql: r"
SELECT
    s.Bamei as horse_name,
    r.TrackCD as track_code,
    COUNT(*) as total_runs,
    SUM(CASE WHEN s.KakuteiJyuni = 1 THEN 1 ELSE 0 END) as wins,
    SUM(CASE WHEN s.KakuteiJyuni <= 3 THEN 1 ELSE 0 END) as top3,
    ROUND(100.0 * SUM(CASE WHEN s.KakuteiJyuni = 1 THEN 1 ELSE 0 END) / COUNT(*), 1) as win_rate
FROM NL_SE s
JOIN NL_RA r
  ON s.Year = r.Year
  AND s.MonthDay = r.MonthDay
  AND s.JyoCD = r.JyoCD
  AND s.Kaiji = r.Kaiji
  AND s.Nichiji = r.Nichiji
  AND s.RaceNum = r.RaceNum
WHERE s.Bamei LIKE {horse_name}
  AND s.KakuteiJyuni IS NOT NULL
  AND s.KakuteiJyuni > 0
GROUP BY s.Bamei, r.TrackCD
ORDER BY total_runs DESC
",
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        assert!(catalog().get("favorite_win_rate").is_some());
        assert!(catalog().get("nonexistent").is_none());
    }

    #[test]
    fn test_list_preserves_definition_order() {
        let names = catalog().names();
        assert_eq!(names.first().map(String::as_str), Some("favorite_win_rate"));
        assert_eq!(
            names.last().map(String::as_str),
            Some("track_condition_stats")
        );
        assert_eq!(names.len(), 11);
    }

    #[test]
    fn test_every_template_slot_has_a_parameter() {
        // Each {slot} in a body must be fillable by some declared parameter.
        for t in catalog().list() {
            let def = catalog().get(t.name).expect("listed template exists");
            let slots: Vec<&'static str> = def.params.iter().map(|p| p.slot()).collect();
            let mut rest = def.sql;
            while let Some(start) = rest.find('{') {
                let after = &rest[start + 1..];
                let end = after.find('}').expect("balanced slot marker");
                let slot = &after[..end];
                assert!(
                    slots.contains(&slot),
                    "template '{}' references slot '{}' with no backing parameter",
                    def.name,
                    slot
                );
                rest = &after[end + 1..];
            }
        }
    }

    #[test]
    fn test_template_info_includes_sql() {
        let info = get_template_info("favorite_win_rate").expect("template exists");
        assert!(info.sql.contains("FROM NL_SE"));
        assert_eq!(info.parameters.len(), 3);
        assert!(info.parameters[0].required);
    }

    #[test]
    fn test_template_info_absent_for_unknown() {
        assert!(get_template_info("nonexistent").is_none());
    }

    #[test]
    fn test_suggest_close_name() {
        assert_eq!(
            catalog().suggest("jocky_stats").as_deref(),
            Some("jockey_stats")
        );
        assert_eq!(catalog().suggest("zzzzzz"), None);
    }

    #[test]
    fn test_summaries_serialize() {
        let json = serde_json::to_value(list_templates()).expect("serializable");
        let first = &json[0];
        assert_eq!(first["name"], "favorite_win_rate");
        assert_eq!(first["parameters"][0]["type"], "int");
    }

    #[test]
    fn test_defaults_declared_for_limits() {
        let def = catalog().get("jockey_stats").expect("template exists");
        let limit = def.param("limit").expect("limit param");
        assert_eq!(limit.default, Some(BindValue::Int(20)));
        assert!(!limit.required);
    }
}
