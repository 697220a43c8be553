//! Coordinate reference system descriptor read from a `.prj` companion.

/// EPSG code of geographic WGS 84.
pub const EPSG_WGS84: u32 = 4326;

/// EPSG code of WGS 84 / Pseudo-Mercator.
pub const EPSG_WEB_MERCATOR: u32 = 3857;

/// ESRI WKT written to `.prj` for EPSG:4326 outputs.
pub const WGS84_ESRI_WKT: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

/// ESRI WKT for EPSG:3857.
pub const WEB_MERCATOR_ESRI_WKT: &str = r#"PROJCS["WGS_1984_Web_Mercator_Auxiliary_Sphere",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Mercator_Auxiliary_Sphere"],PARAMETER["False_Easting",0.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",0.0],PARAMETER["Standard_Parallel_1",0.0],PARAMETER["Auxiliary_Sphere_Type",0.0],UNIT["Meter",1.0]]"#;

/// A CRS known either by EPSG code, by WKT text, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crs {
    epsg: Option<u32>,
    wkt: Option<String>,
}

impl Crs {
    /// CRS identified only by its EPSG code.
    pub fn epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            wkt: None,
        }
    }

    /// Parse the contents of a `.prj` file.
    ///
    /// Returns `None` for blank text, which the pipeline treats as an
    /// undefined CRS.
    pub fn from_wkt(text: &str) -> Option<Self> {
        let wkt = text.trim().trim_start_matches('\u{feff}');
        if wkt.is_empty() {
            return None;
        }

        let epsg = root_authority_code(wkt).or_else(|| well_known_root(wkt));

        Some(Self {
            epsg,
            wkt: Some(wkt.to_string()),
        })
    }

    /// EPSG code, when one could be identified.
    pub fn epsg_code(&self) -> Option<u32> {
        self.epsg
    }

    /// Whether this CRS is the given EPSG code.
    pub fn is_epsg(&self, code: u32) -> bool {
        self.epsg == Some(code)
    }

    /// Whether two descriptors denote the same CRS.
    pub fn same_as(&self, other: &Crs) -> bool {
        match (self.epsg, other.epsg) {
            (Some(a), Some(b)) => a == b,
            _ => self.wkt.is_some() && self.wkt == other.wkt,
        }
    }

    /// Definition string handed to PROJ.
    pub fn proj_definition(&self) -> String {
        match (self.epsg, &self.wkt) {
            (Some(code), _) => format!("EPSG:{}", code),
            (None, Some(wkt)) => wkt.clone(),
            // Unreachable through the public constructors.
            (None, None) => String::new(),
        }
    }

    /// WKT to write into an output `.prj`, if one is known.
    pub fn prj_wkt(&self) -> Option<&str> {
        match self.epsg {
            Some(EPSG_WGS84) => Some(WGS84_ESRI_WKT),
            Some(EPSG_WEB_MERCATOR) => Some(WEB_MERCATOR_ESRI_WKT),
            _ => self.wkt.as_deref(),
        }
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.epsg, &self.wkt) {
            (Some(code), _) => write!(f, "EPSG:{}", code),
            (None, Some(wkt)) => write!(f, "{}", root_name(wkt).unwrap_or("custom WKT")),
            (None, None) => write!(f, "undefined"),
        }
    }
}

/// EPSG code from an `AUTHORITY["EPSG","n"]` or `ID["EPSG",n]` that sits
/// directly under the root node.
fn root_authority_code(wkt: &str) -> Option<u32> {
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut keyword = String::new();
    let mut capture: Option<String> = None;
    let mut found = None;

    for c in wkt.chars() {
        if in_quote {
            if c == '"' {
                in_quote = false;
            }
            if let Some(buf) = capture.as_mut()
                && depth == 2
            {
                buf.push(c);
            }
            continue;
        }

        match c {
            '"' => {
                in_quote = true;
                if let Some(buf) = capture.as_mut()
                    && depth == 2
                {
                    buf.push(c);
                }
            }
            '[' | '(' => {
                if depth == 1
                    && (keyword.eq_ignore_ascii_case("AUTHORITY") || keyword.eq_ignore_ascii_case("ID"))
                {
                    capture = Some(String::new());
                }
                depth += 1;
                keyword.clear();
            }
            ']' | ')' => {
                depth = depth.saturating_sub(1);
                if depth == 1
                    && let Some(buf) = capture.take()
                    && let Some(code) = parse_epsg_args(&buf)
                {
                    found = Some(code);
                }
                keyword.clear();
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                keyword.push(c);
                if let Some(buf) = capture.as_mut()
                    && depth == 2
                {
                    buf.push(c);
                }
            }
            c if c.is_whitespace() => {}
            _ => {
                keyword.clear();
                if let Some(buf) = capture.as_mut()
                    && depth == 2
                {
                    buf.push(c);
                }
            }
        }
    }

    found
}

/// Parse `"EPSG","4326"` or `"EPSG",4326`.
fn parse_epsg_args(args: &str) -> Option<u32> {
    let mut parts = args.split(',').map(|p| p.trim().trim_matches('"'));
    let authority = parts.next()?;
    if !authority.eq_ignore_ascii_case("EPSG") {
        return None;
    }
    parts.next()?.parse().ok()
}

/// First quoted string, which WKT places as the root node's name.
fn root_name(wkt: &str) -> Option<&str> {
    let start = wkt.find('"')? + 1;
    let len = wkt[start..].find('"')?;
    Some(&wkt[start..start + len])
}

/// Recognise the root names that ESRI-style `.prj` files use without an
/// authority clause.
fn well_known_root(wkt: &str) -> Option<u32> {
    let keyword = wkt
        .split(['[', '('])
        .next()?
        .trim()
        .to_ascii_uppercase();
    let name: String = root_name(wkt)?
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    match (keyword.as_str(), name.as_str()) {
        ("GEOGCS" | "GEOGCRS" | "GEODCRS", "gcswgs1984" | "wgs84" | "wgs1984") => Some(EPSG_WGS84),
        (
            "PROJCS" | "PROJCRS",
            "wgs1984webmercatorauxiliarysphere" | "wgs84pseudomercator" | "wgs1984webmercator",
        ) => Some(EPSG_WEB_MERCATOR),
        _ => None,
    }
}
