//! SQL and catalogue-name templating
//!
//! Queries are plain SQL with named placeholders for the chunk bounding box
//! and the server-side table name. Substitution is pure string replacement;
//! the table name is caller-controlled and trusted, so nothing is escaped.

use crate::error::{Result, SkycatError};
use crate::types::Region;

/// Placeholder substituted with the chunk index in catalogue name templates
pub const NAME_INDEX_PLACEHOLDER: &str = "{}";

/// A SQL query template with `{raLow}`, `{raHigh}`, `{decLow}`, `{decHigh}`
/// and `{table_name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    sql: String,
}

/// Built-in query templates, recovered from the survey scripts this tool
/// replaces. `Ps1View` is the default for production runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinQuery {
    /// Bright, probably-real objects from the PS1 stackObjectView
    Ps1View,
    /// PS1 stackObjectThin joined against StackObjectAttributes
    Ps1,
    /// SDSS PhotoPrimary comparison sample
    Sdss,
    /// Ten rows into MyDB, for exercising the pipeline
    Test,
}

impl std::str::FromStr for BuiltinQuery {
    type Err = SkycatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ps1-view" | "ps1view" => Ok(BuiltinQuery::Ps1View),
            "ps1" => Ok(BuiltinQuery::Ps1),
            "sdss" => Ok(BuiltinQuery::Sdss),
            "test" => Ok(BuiltinQuery::Test),
            _ => Err(SkycatError::Parse(format!(
                "unknown builtin query '{}' (expected ps1-view, ps1, sdss or test)",
                s
            ))),
        }
    }
}

impl QueryTemplate {
    /// Wrap an arbitrary SQL template string
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }

    /// Look up one of the built-in templates
    pub fn builtin(which: BuiltinQuery) -> Self {
        let sql = match which {
            BuiltinQuery::Ps1View => QUERY_PS1_VIEW,
            BuiltinQuery::Ps1 => QUERY_PS1,
            BuiltinQuery::Sdss => QUERY_SDSS,
            BuiltinQuery::Test => QUERY_TEST,
        };
        Self::new(sql)
    }

    /// Substitute the bounding box and table name into the template.
    ///
    /// Pure function; placeholders absent from the template are simply left
    /// unused, so the tiny test query renders without a location cut.
    pub fn render(&self, region: &Region, table_name: &str) -> String {
        self.sql
            .replace("{raLow}", &format!("{}", region.ra_low))
            .replace("{raHigh}", &format!("{}", region.ra_high))
            .replace("{decLow}", &format!("{}", region.dec_low))
            .replace("{decHigh}", &format!("{}", region.dec_high))
            .replace("{table_name}", table_name)
    }

    /// The raw template text
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// Substitute a chunk index into a catalogue name template.
///
/// Only the first `{}` is replaced, so a literal brace pair later in the
/// name survives untouched.
pub fn render_catalogue_name(template: &str, index: usize) -> String {
    template.replacen(NAME_INDEX_PLACEHOLDER, &index.to_string(), 1)
}

/// Check a catalogue name template up front.
///
/// With more than one chunk the template must contain the index placeholder,
/// otherwise every chunk would overwrite the same output file.
pub fn validate_name_template(template: &str, nchunks: i64) -> Result<()> {
    if nchunks > 1 && !template.contains(NAME_INDEX_PLACEHOLDER) {
        return Err(SkycatError::Template(format!(
            "catalogue name template '{}' has no '{{}}' placeholder but {} chunks were requested \
             (e.g. use 'cat_{{}}')",
            template, nchunks
        )));
    }
    Ok(())
}

// ============================================================================
// Built-in query text
// ============================================================================

const QUERY_PS1_VIEW: &str = r#"
-- Select a bright catalogue of objects
-- which are probably real

select uniquePspsSTid, objID, ira, idec,
gKronMag, gKronMagErr,
rKronMag, rKronMagErr,
iKronMag, iKronMagErr,
gPSFMag, gPSFMagErr,
rPSFMag, rPSFMagErr,
iPSFMag, iPSFMagErr,
ginfoFlag, ginfoFlag2, ginfoFlag3,
rinfoFlag, rinfoFlag2, rinfoFlag3,
iinfoFlag, iinfoFlag2, iinfoFlag3,

-- Galactic latitude
b,

-- Stuff for s/g separation if needed
ipsfMajorFWHM,
ipsfMinorFWHM,
iKronRad
INTO mydb.[{table_name}] FROM stackObjectView
WHERE iKronMag < 25.0

-- Require detections in two bands
AND rKronMag > 0.0
AND iKronMag > 0.0

-- Remove low galactic latitude sources
AND ABS(b) > 20.0

-- Location cut
AND ira BETWEEN {raLow} AND {raHigh}
AND idec BETWEEN {decLow} AND {decHigh}

-- Deal with overlaps
AND primaryDetection = 1;
"#;

const QUERY_PS1: &str = r#"
-- Select a bright catalogue of objects
-- which are probably real

select st.uniquePspsSTid, st.objID, ira, idec,
gKronMag, gKronMagErr,
rKronMag, rKronMagErr,
iKronMag, iKronMagErr,
gPSFMag, gPSFMagErr,
rPSFMag, rPSFMagErr,
iPSFMag, iPSFMagErr,
ginfoFlag, ginfoFlag2, ginfoFlag3,
rinfoFlag, rinfoFlag2, rinfoFlag3,
iinfoFlag, iinfoFlag2, iinfoFlag3,

-- Stuff for s/g separation if needed
sa.ipsfMajorFWHM,
sa.ipsfMinorFWHM,
sa.iKronRad
INTO mydb.[{table_name}] FROM stackObjectThin as st
JOIN StackObjectAttributes as sa on st.uniquePspsSTid=sa.uniquePspsSTid
WHERE iKronMag < 25.0

-- Location cut
AND ira BETWEEN {raLow} AND {raHigh}
AND idec BETWEEN {decLow} AND {decHigh}

-- Deal with overlaps
AND st.primaryDetection = 1;
"#;

const QUERY_SDSS: &str = r#"
-- Select an SDSS comparison sample
SELECT objID, ra, dec, type, psfMag_g, psfMag_r, psfMag_i, petroMag_g, petroMag_r, petroMag_i, g, r, i,
flags_g, flags_r, flags_i
INTO mydb.{table_name} from PhotoPrimary
WHERE ra BETWEEN {raLow} AND {raHigh}
AND dec BETWEEN {decLow} AND {decHigh}
"#;

const QUERY_TEST: &str = "select top 10 * from StackObjectThin into mydb.[{table_name}]";
