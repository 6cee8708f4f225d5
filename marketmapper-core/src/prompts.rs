//! Prompt templates sent to the language model
//!
//! Three prompts ask for Overpass queries around the submitted point; two
//! more ask for a density assessment and the final scores. Every template
//! fixes the output format because replies are parsed, not read.

use crate::scoring::{DensityAssessment, FeatureCounts};
use crate::submission::Submission;

/// Search radius, in metres, used by every generated query
pub const SEARCH_RADIUS_M: u32 = 1000;

/// Prompt used by the `/test` diagnostic route
pub const DIAGNOSTIC_PROMPT: &str = "Hello how are you";

/// Which of the three map queries a prompt asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Competition,
    Complementary,
    Accessibility,
}

impl QueryKind {
    pub const ALL: [QueryKind; 3] = [
        QueryKind::Competition,
        QueryKind::Complementary,
        QueryKind::Accessibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Competition => "competition",
            QueryKind::Complementary => "complementary",
            QueryKind::Accessibility => "accessibility",
        }
    }

    pub fn prompt(&self, submission: &Submission) -> String {
        match self {
            QueryKind::Competition => competition_prompt(submission),
            QueryKind::Complementary => complementary_prompt(submission),
            QueryKind::Accessibility => accessibility_prompt(submission),
        }
    }
}

const OUTPUT_RULES: &str = "\
### OUTPUT
- Return ONLY the raw Overpass QL string, starting with [out:json][timeout:30];
- No markdown, no code fences, no explanations.";

pub fn competition_prompt(submission: &Submission) -> String {
    let at = submission.coordinates();
    format!(
        "You are a senior geospatial engineer.
Write a lightweight Overpass query that finds direct competitors of this business: \"{business}\".

### CONSTRAINTS
- Query only node and way elements, never relations.
- Use at most the 2 most relevant OSM keys (for example amenity, shop or craft).
- End the query with \"out tags center;\".

### SHAPE
[out:json][timeout:30];
(
  node(around:{radius},{at})[key~\"val1|val2\",i];
  way(around:{radius},{at})[key~\"val1|val2\",i];
);
out tags center;

{rules}",
        business = submission.business,
        radius = SEARCH_RADIUS_M,
        at = at,
        rules = OUTPUT_RULES,
    )
}

pub fn complementary_prompt(submission: &Submission) -> String {
    let at = submission.coordinates();
    format!(
        "You are a senior geospatial engineer and business intelligence analyst.
Write a lightweight Overpass query that finds businesses which bring foot traffic to this business: \"{business}\".

### RULES
- Pick 2 to 4 strongly complementary categories.
- Query only nodes.
- Keep each tag regex short, 3 to 4 keywords at most.
- Search within {radius} m of {at}.
- End the query with \"out center;\".

{rules}",
        business = submission.business,
        radius = SEARCH_RADIUS_M,
        at = at,
        rules = OUTPUT_RULES,
    )
}

pub fn accessibility_prompt(submission: &Submission) -> String {
    let at = submission.coordinates();
    format!(
        "You are a senior geospatial engineer and urban planner.
Write an ultra-lightweight Overpass query that measures public-transport access around {at}.

### RULES
- Query only nodes; never query highway ways.
- Target bus stops, platforms, railway stations, subway entrances and taxi points.
- End the query with \"out tags center;\".

### SHAPE
[out:json][timeout:30];
(
  node(around:{radius},{at})[highway~\"bus_stop|platform\",i];
  node(around:{radius},{at})[railway~\"station|subway_entrance\",i];
  node(around:{radius},{at})[amenity~\"bus_station|taxi\",i];
);
out tags center;

{rules}",
        radius = SEARCH_RADIUS_M,
        at = at,
        rules = OUTPUT_RULES,
    )
}

pub fn density_prompt(submission: &Submission) -> String {
    format!(
        "You are a senior business intelligence analyst and urban planner.

### INPUT
- Location: {location}
- Latitude: {lat}
- Longitude: {lon}

### TASK
1. Estimate the residential and commercial density of this area on a 0-100 scale
   (dense urban centre 90+, suburban around 40, rural around 10).
2. From that density, choose how many competitors, complementary businesses and
   transit access points within {radius} m would saturate the area. Caps must be positive.

### OUTPUT (JSON only, no markdown)
{{
  \"densityScore\": number,
  \"caps\": {{ \"competition\": number, \"complementary\": number, \"accessibility\": number }}
}}",
        location = submission.location,
        lat = submission.latitude,
        lon = submission.longitude,
        radius = SEARCH_RADIUS_M,
    )
}

pub fn scoring_prompt(
    submission: &Submission,
    counts: &FeatureCounts,
    density: &DensityAssessment,
) -> String {
    format!(
        "You are a senior business intelligence analyst.

### INPUT
- Business: \"{business}\"
- Location: {location} (lat {lat}, lon {lon})
- Competitor count: {competitors}
- Complementary count: {complements}
- Accessibility count: {access}
- Density score: {density_score}
- Caps: competition {cap_comp}, complementary {cap_compl}, accessibility {cap_acc}

### FORMULAS
- competition = max(0, 100 - (competitorCount / competitionCap) * 100)
- complementary = min(100, (complementCount / complementaryCap) * 100)
- accessibility = min(100, (accessibilityCount / accessibilityCap) * 100)
- density = the density score above

### OUTPUT (JSON only, no markdown, every number between 0 and 100)
{{
  \"densityScore\": number,
  \"scores\": {{ \"competition\": number, \"complementary\": number, \"accessibility\": number, \"density\": number }},
  \"verdict\": \"short summary of viability\"
}}",
        business = submission.business,
        location = submission.location,
        lat = submission.latitude,
        lon = submission.longitude,
        competitors = counts.competitors,
        complements = counts.complements,
        access = counts.access_points,
        density_score = density.density_score,
        cap_comp = density.caps.competition,
        cap_compl = density.caps.complementary,
        cap_acc = density.caps.accessibility,
    )
}
