use url::Url;

/// Fields requested from the missions list, in OData `$select` order
pub const MISSION_FIELDS: [&str; 7] = [
    "Id",
    "Title",
    "Rocket",
    "Commander",
    "SrPilotCmPilot",
    "PilotLmPilot",
    "LaunchDate",
];

pub const MISSION_ORDER: &str = "LaunchDate";

/// One upstream request, built fresh per call
#[derive(Debug, Clone)]
pub struct UpstreamQuery<'a> {
    base: &'a Url,
    record_id: Option<u64>,
    select: &'a [&'a str],
    order_by: Option<&'a str>,
}

impl<'a> UpstreamQuery<'a> {
    /// All missions, oldest launch first
    pub fn collection(base: &'a Url) -> Self {
        Self {
            base,
            record_id: None,
            select: &MISSION_FIELDS,
            order_by: Some(MISSION_ORDER),
        }
    }

    /// A single mission addressed as `base(<id>)`
    pub fn single(base: &'a Url, record_id: u64) -> Self {
        Self {
            base,
            record_id: Some(record_id),
            select: &MISSION_FIELDS,
            order_by: None,
        }
    }

    pub fn to_url(&self) -> Url {
        let mut url = self.base.clone();

        if let Some(id) = self.record_id {
            let path = format!("{}({})", url.path().trim_end_matches('/'), id);
            url.set_path(&path);
        }

        // `$` and `,` are left literal; OData expects them unescaped
        let mut query = format!("$select={}", self.select.join(","));
        if let Some(order_by) = self.order_by {
            query.push_str("&$orderby=");
            query.push_str(order_by);
        }
        url.set_query(Some(&query));

        url
    }
}
