//! Source dataset inventory and retrieval contract.
//!
//! The pipeline operates on a bounded, known set of source datasets: three
//! administrative boundary sources (US, CA, MX) and five ecoregion levels
//! (CEC continental L1-L3, EPA US L3/L4). Each gets a [`SourceSpec`]
//! carrying its archive location, native spatial reference, column
//! mapping, and resolution strategy — all explicit configuration, nothing
//! inferred from dataset identity at run time.
//!
//! Retrieval itself (download, unzip, shapefile read) is an external
//! collaborator behind [`SourceProvider`]; the bundled implementation
//! reads pre-extracted tab-separated WKT dumps from a local directory.

use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::model::{Country, RegionLevel};
use ecolink_frame::{NormalizeSpec, RawTable};
use ecolink_geo::{AlbersParams, Crs};
use ecolink_resolve::ResolveStrategy;
use tracing::info;

/// What kind of records a source contributes, with its per-dataset
/// resolution choice.
#[derive(Debug, Clone)]
pub enum SourceKind {
    Boundary {
        country: Country,
        strategy: ResolveStrategy,
    },
    Region {
        level: RegionLevel,
    },
}

/// Configuration for one source dataset.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    /// Stable dataset id, also the stem of its dump file.
    pub id: String,
    /// Archive URL the dataset is retrieved from.
    pub url: String,
    /// Shapefile name inside the archive, when the archive holds several.
    pub target_file: Option<String>,
    /// Native spatial reference of the shapefile.
    pub native_crs: Crs,
    /// Column mapping into the common schema.
    pub normalize: NormalizeSpec,
    pub kind: SourceKind,
}

/// The eight known source datasets.
pub fn builtin_sources() -> Vec<SourceSpec> {
    let na_albers = Crs::Albers(AlbersParams::north_america());
    let us_albers = Crs::Albers(AlbersParams::conus());

    vec![
        SourceSpec {
            id: "us-states".into(),
            url: "https://www2.census.gov/geo/tiger/TIGER2021/STATE/tl_2021_us_state.zip".into(),
            target_file: None,
            native_crs: Crs::Geographic,
            normalize: NormalizeSpec::new()
                .map("NAME", "name")
                .map("STATEFP", "identifier")
                .map("STUSPS", "abbreviation")
                .constant("country", "US"),
            kind: SourceKind::Boundary {
                country: Country::Us,
                strategy: ResolveStrategy::Direct {
                    property: "P5087".into(),
                },
            },
        },
        SourceSpec {
            id: "ca-provinces".into(),
            url: "https://www12.statcan.gc.ca/census-recensement/2021/geo/sip-pis/boundary-limites/files-fichiers/lpr_000b21a_e.zip".into(),
            target_file: None,
            native_crs: Crs::Geographic,
            normalize: NormalizeSpec::new()
                .map("PRENAME", "name")
                .map("PRUID", "identifier")
                .map("PREABBR", "abbreviation")
                .constant("country", "CA"),
            kind: SourceKind::Boundary {
                country: Country::Ca,
                // Provinces and territories span two type classes with no
                // shared identifier property.
                strategy: ResolveStrategy::Prefetch,
            },
        },
        SourceSpec {
            id: "mx-states".into(),
            url: "http://geoportal.conabio.gob.mx/descargas/mapas/geografia/dest_2019gw.zip".into(),
            target_file: None,
            native_crs: Crs::Geographic,
            normalize: NormalizeSpec::new()
                .map("NOM_ENT", "name")
                .map("CVE_ENT", "identifier")
                .null_column("abbreviation")
                .constant("country", "MX"),
            kind: SourceKind::Boundary {
                country: Country::Mx,
                strategy: ResolveStrategy::Direct {
                    property: "P901".into(),
                },
            },
        },
        SourceSpec {
            id: "na-eco-l1".into(),
            url: "http://www.cec.org/files/atlas_layers/1_terrestrial_ecosystems/1_01_0_terrestrial_ecoregions_level_i/na_terrestrial_ecoregions_v2_level_i_shapefile.zip".into(),
            target_file: Some("NA_CEC_Eco_Level1.shp".into()),
            native_crs: na_albers,
            normalize: NormalizeSpec::new()
                .map("NA_L1CODE", "code")
                .map("NA_L1NAME", "common_name"),
            kind: SourceKind::Region {
                level: RegionLevel::NaL1,
            },
        },
        SourceSpec {
            id: "na-eco-l2".into(),
            url: "http://www.cec.org/files/atlas_layers/1_terrestrial_ecosystems/1_01_1_terrestrial_ecoregions_level_ii/na_terrestrial_ecoregions_v2_level_ii_shapefile.zip".into(),
            target_file: Some("NA_CEC_Eco_Level2.shp".into()),
            native_crs: na_albers,
            normalize: NormalizeSpec::new()
                .map("NA_L2CODE", "code")
                .map("NA_L2NAME", "common_name")
                .keep("NA_L1CODE"),
            kind: SourceKind::Region {
                level: RegionLevel::NaL2,
            },
        },
        SourceSpec {
            id: "na-eco-l3".into(),
            url: "http://www.cec.org/files/atlas_layers/1_terrestrial_ecosystems/1_01_2_terrestrial_ecoregions_level_iii/na_terrestrial_ecoregions_level_iii_shapefile.zip".into(),
            target_file: Some("NA_CEC_Eco_Level3.shp".into()),
            native_crs: na_albers,
            normalize: NormalizeSpec::new()
                .map("NA_L3CODE", "code")
                .map("NA_L3NAME", "common_name")
                .keep("NA_L1CODE")
                .keep("NA_L2CODE"),
            kind: SourceKind::Region {
                level: RegionLevel::NaL3,
            },
        },
        SourceSpec {
            id: "us-eco-l3".into(),
            url: "https://gaftp.epa.gov/EPADataCommons/ORD/Ecoregions/us/us_eco_l3.zip".into(),
            target_file: None,
            native_crs: us_albers,
            normalize: NormalizeSpec::new()
                .map("US_L3CODE", "code")
                .map("US_L3NAME", "common_name")
                .keep("NA_L1CODE")
                .keep("NA_L2CODE")
                .keep("NA_L3CODE"),
            kind: SourceKind::Region {
                level: RegionLevel::UsL3,
            },
        },
        SourceSpec {
            id: "us-eco-l4".into(),
            url: "https://gaftp.epa.gov/EPADataCommons/ORD/Ecoregions/us/us_eco_l4_no_st.zip".into(),
            target_file: None,
            native_crs: us_albers,
            normalize: NormalizeSpec::new()
                .map("US_L4CODE", "code")
                .map("US_L4NAME", "common_name")
                .keep("NA_L1CODE")
                .keep("NA_L2CODE")
                .keep("NA_L3CODE")
                .keep("US_L3CODE"),
            kind: SourceKind::Region {
                level: RegionLevel::UsL4,
            },
        },
    ]
}

/// Retrieval collaborator: turns a source spec into a raw table.
pub trait SourceProvider {
    fn fetch(&self, spec: &SourceSpec) -> Result<RawTable>;
}

/// Reads pre-extracted tab-separated WKT dumps: one `<id>.tsv` per
/// source, header row of column names with a mandatory `geometry` column
/// holding WKT text, empty cells as nulls.
pub struct FileSourceProvider {
    dir: PathBuf,
}

impl FileSourceProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn parse_tsv(&self, spec: &SourceSpec, text: &str) -> Result<RawTable> {
        let mut lines = text.lines();
        let header = lines.next().ok_or_else(|| PipelineError::Source {
            dataset: spec.id.clone(),
            message: "empty dump file".into(),
        })?;
        let header: Vec<&str> = header.split('\t').collect();
        let geometry_index = header
            .iter()
            .position(|&c| c == "geometry")
            .ok_or_else(|| PipelineError::Source {
                dataset: spec.id.clone(),
                message: "dump file has no geometry column".into(),
            })?;

        let columns: Vec<String> = header
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != geometry_index)
            .map(|(_, c)| c.to_string())
            .collect();

        let mut rows = Vec::new();
        let mut geometry_wkt = Vec::new();
        for (line_no, line) in lines.enumerate() {
            if line.is_empty() {
                continue;
            }
            let cells: Vec<&str> = line.split('\t').collect();
            if cells.len() != header.len() {
                return Err(PipelineError::Source {
                    dataset: spec.id.clone(),
                    message: format!(
                        "row {} has {} cells, expected {}",
                        line_no + 2,
                        cells.len(),
                        header.len()
                    ),
                });
            }
            let mut row = Vec::with_capacity(columns.len());
            for (i, cell) in cells.iter().enumerate() {
                if i == geometry_index {
                    geometry_wkt.push(cell.to_string());
                } else {
                    row.push((!cell.is_empty()).then(|| cell.to_string()));
                }
            }
            rows.push(row);
        }

        Ok(RawTable::new(columns, rows, geometry_wkt, spec.native_crs)?)
    }
}

impl SourceProvider for FileSourceProvider {
    fn fetch(&self, spec: &SourceSpec) -> Result<RawTable> {
        let path = self.dir.join(format!("{}.tsv", spec.id));
        info!(source = spec.id.as_str(), path = %path.display(), "reading source dump");
        let text = read_dump(&path, spec)?;
        self.parse_tsv(spec, &text)
    }
}

fn read_dump(path: &Path, spec: &SourceSpec) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| PipelineError::Source {
        dataset: spec.id.clone(),
        message: format!("reading {}: {}", path.display(), e),
    })
}
