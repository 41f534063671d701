//! Accept header parsing and media type matching.

/// One entry of an Accept header, e.g. `application/*;q=0.5`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    pub main: String,
    pub sub: String,
    pub quality: f32,
}

impl MediaRange {
    fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(';');
        let (main, sub) = split_essence(parts.next()?)?;

        let quality = parts
            .filter_map(|param| {
                let (key, value) = param.split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("q")
                    .then(|| value.trim().parse::<f32>().ok())
                    .flatten()
            })
            .next()
            .unwrap_or(1.0);

        Some(Self { main, sub, quality })
    }

    /// Wildcards on either side match anything in that position.
    fn permits(&self, main: &str, sub: &str) -> bool {
        let main_ok = self.main == "*" || main == "*" || self.main == main;
        let sub_ok = self.sub == "*" || sub == "*" || self.sub == sub;
        main_ok && sub_ok
    }
}

/// Lower-cased `type/subtype` without parameters.
fn split_essence(content_type: &str) -> Option<(String, String)> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let (main, sub) = essence.split_once('/')?;
    if main.is_empty() || sub.is_empty() {
        return None;
    }
    Some((main.to_string(), sub.to_string()))
}

/// The media types a client will accept, in header order.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptList {
    ranges: Vec<MediaRange>,
}

impl Default for AcceptList {
    fn default() -> Self {
        Self::any()
    }
}

impl AcceptList {
    /// `*/*`.
    pub fn any() -> Self {
        Self {
            ranges: vec![MediaRange {
                main: "*".into(),
                sub: "*".into(),
                quality: 1.0,
            }],
        }
    }

    /// Parse an Accept header. Absent, empty or unparseable headers mean `*/*`;
    /// ranges with `q=0` are dropped.
    pub fn parse(header: Option<&str>) -> Self {
        let Some(header) = header.filter(|h| !h.trim().is_empty()) else {
            return Self::any();
        };

        let parsed: Vec<MediaRange> = header.split(',').filter_map(MediaRange::parse).collect();
        if parsed.is_empty() {
            return Self::any();
        }

        Self {
            ranges: parsed.into_iter().filter(|r| r.quality > 0.0).collect(),
        }
    }

    pub fn ranges(&self) -> &[MediaRange] {
        &self.ranges
    }

    /// Whether a response of `content_type` would be acceptable.
    pub fn accepts(&self, content_type: &str) -> bool {
        match split_essence(content_type) {
            Some((main, sub)) => self.ranges.iter().any(|r| r.permits(&main, &sub)),
            None => false,
        }
    }

    /// First candidate, in the candidates' own order, that is acceptable.
    pub fn select<'a, I>(&self, candidates: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates.into_iter().find(|c| self.accepts(c))
    }
}

/// Whether a declared media type (possibly a wildcard) covers `content_type`.
pub fn covers(declared: &str, content_type: &str) -> bool {
    match (split_essence(declared), split_essence(content_type)) {
        (Some((dm, ds)), Some((cm, cs))) => {
            (dm == "*" || dm == cm) && (ds == "*" || ds == cs)
        }
        _ => false,
    }
}

/// `application/json` and structured-syntax `+json` types.
pub fn is_json(content_type: &str) -> bool {
    split_essence(content_type)
        .map(|(main, sub)| {
            (main == "application" || main == "*") && (sub == "json" || sub.ends_with("+json"))
        })
        .unwrap_or(false)
}
