use std::sync::Arc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Upper bound on parent hops when looking for the LMS adapter
pub const MAX_HOST_HOPS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScormVersion {
    /// `API` adapter
    #[serde(rename = "1.2")]
    Scorm12,
    /// `API_1484_11` adapter
    #[serde(rename = "2004")]
    Scorm2004,
}

impl ScormVersion {
    fn method(&self, call: ScormMethod) -> &'static str {
        match (self, call) {
            (ScormVersion::Scorm2004, ScormMethod::Initialize) => "Initialize",
            (ScormVersion::Scorm2004, ScormMethod::SetValue) => "SetValue",
            (ScormVersion::Scorm2004, ScormMethod::Commit) => "Commit",
            (ScormVersion::Scorm12, ScormMethod::Initialize) => "LMSInitialize",
            (ScormVersion::Scorm12, ScormMethod::SetValue) => "LMSSetValue",
            (ScormVersion::Scorm12, ScormMethod::Commit) => "LMSCommit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScormMethod {
    Initialize,
    SetValue,
    Commit,
}

/// The runtime adapter an LMS exposes to a hosted lesson
pub trait ScormApi: Send + Sync {
    fn initialize(&self) -> bool;
    fn set_value(&self, element: &str, value: &str) -> bool;
    fn commit(&self) -> bool;
}

/// One frame in the chain of hosting windows
pub trait ApiHost: Send + Sync {
    fn api_2004(&self) -> Option<Arc<dyn ScormApi>>;
    fn api_12(&self) -> Option<Arc<dyn ScormApi>>;
    fn parent(&self) -> Option<Arc<dyn ApiHost>>;
}

/// Anything that can receive the learner's final score
pub trait LmsBridge: Send + Sync {
    /// Open the LMS session. Returns false when no LMS is reachable.
    fn initialize(&self) -> bool;
    /// Returns false when no LMS is reachable
    fn report_score(&self, score: u32) -> bool;
}

/// Standalone runs have no LMS to report to
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLms;

impl LmsBridge for NoLms {
    fn initialize(&self) -> bool {
        false
    }

    fn report_score(&self, score: u32) -> bool {
        tracing::debug!(score = score, "No LMS attached, score not reported");
        false
    }
}

/// One adapter call for the page that owns the adapter to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScormCall {
    pub version: ScormVersion,
    pub method: &'static str,
    pub args: Vec<String>,
}

/// Carries adapter calls out to the embedding page
pub trait ScormSink: Send + Sync {
    fn send(&self, call: ScormCall) -> bool;
}

struct ForwardedApi {
    version: ScormVersion,
    sink: Arc<dyn ScormSink>,
}

impl ForwardedApi {
    fn call(&self, method: ScormMethod, args: Vec<String>) -> bool {
        self.sink.send(ScormCall {
            version: self.version,
            method: self.version.method(method),
            args,
        })
    }
}

impl ScormApi for ForwardedApi {
    fn initialize(&self) -> bool {
        self.call(ScormMethod::Initialize, vec![String::new()])
    }

    fn set_value(&self, element: &str, value: &str) -> bool {
        self.call(ScormMethod::SetValue, vec![element.to_string(), value.to_string()])
    }

    fn commit(&self) -> bool {
        self.call(ScormMethod::Commit, vec![String::new()])
    }
}

/// Host whose adapter lives in the embedding page. The page walks its own
/// window chain and announces which adapter it found; calls are forwarded
/// through the sink.
pub struct AnnouncedHost {
    announced: RwLock<Option<ScormVersion>>,
    sink: Arc<dyn ScormSink>,
}

impl AnnouncedHost {
    pub fn new(sink: Arc<dyn ScormSink>) -> Self {
        AnnouncedHost {
            announced: RwLock::new(None),
            sink,
        }
    }

    pub fn announce(&self, version: Option<ScormVersion>) {
        tracing::info!(version = ?version, "LMS adapter announced by page");
        *self.announced.write() = version;
    }

    pub fn announced(&self) -> Option<ScormVersion> {
        *self.announced.read()
    }

    fn forwarded(&self, version: ScormVersion) -> Option<Arc<dyn ScormApi>> {
        (self.announced() == Some(version)).then(|| {
            Arc::new(ForwardedApi {
                version,
                sink: Arc::clone(&self.sink),
            }) as Arc<dyn ScormApi>
        })
    }
}

impl ApiHost for AnnouncedHost {
    fn api_2004(&self) -> Option<Arc<dyn ScormApi>> {
        self.forwarded(ScormVersion::Scorm2004)
    }

    fn api_12(&self) -> Option<Arc<dyn ScormApi>> {
        self.forwarded(ScormVersion::Scorm12)
    }

    fn parent(&self) -> Option<Arc<dyn ApiHost>> {
        None
    }
}

pub struct ScormBridge {
    host: Arc<dyn ApiHost>,
    max_score: u32,
}

impl ScormBridge {
    pub fn new(host: Arc<dyn ApiHost>, max_score: u32) -> Self {
        ScormBridge { host, max_score }
    }

    /// Walk up the host chain, preferring SCORM 2004 at each level
    pub fn find_api(&self) -> Option<(ScormVersion, Arc<dyn ScormApi>)> {
        let mut host = Arc::clone(&self.host);
        for _ in 0..=MAX_HOST_HOPS {
            if let Some(api) = host.api_2004() {
                return Some((ScormVersion::Scorm2004, api));
            }
            if let Some(api) = host.api_12() {
                return Some((ScormVersion::Scorm12, api));
            }
            host = host.parent()?;
        }
        tracing::warn!(max_hops = MAX_HOST_HOPS, "LMS adapter search gave up");
        None
    }
}

impl LmsBridge for ScormBridge {
    fn initialize(&self) -> bool {
        match self.find_api() {
            Some((version, api)) => {
                let ok = api.initialize();
                tracing::info!(version = ?version, ok = ok, "LMS connection established");
                true
            }
            None => {
                tracing::info!("No LMS adapter found, running standalone");
                false
            }
        }
    }

    fn report_score(&self, score: u32) -> bool {
        let Some((version, api)) = self.find_api() else {
            tracing::warn!(score = score, "No LMS adapter found, score not reported");
            return false;
        };
        let score = score.to_string();
        match version {
            ScormVersion::Scorm2004 => {
                api.set_value("cmi.score.raw", &score);
                api.set_value("cmi.score.max", &self.max_score.to_string());
                api.set_value("cmi.completion_status", "completed");
                api.commit();
            }
            ScormVersion::Scorm12 => {
                api.set_value("cmi.core.score.raw", &score);
                api.set_value("cmi.core.lesson_status", "completed");
                api.commit();
            }
        }
        tracing::info!(version = ?version, score = %score, "Score reported to LMS");
        true
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// SCORM 1.2 imsmanifest.xml for packaging the lesson as a single SCO
pub fn scorm_manifest(course_title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest identifier="PhyEM_SCORM" version="1" xmlns="http://www.imsproject.org/xsd/imscp_rootv1p1p2" xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_rootv1p2" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.imsproject.org/xsd/imscp_rootv1p1p2 imscp_rootv1p1p2.xsd http://www.imsglobal.org/xsd/imsmd_rootv1p2 imsmd_rootv1p2.xsd http://www.adlnet.org/xsd/adlcp_rootv1p2 adlcp_rootv1p2.xsd">
  <metadata>
    <schema>ADL SCORM</schema>
    <schemaversion>1.2</schemaversion>
  </metadata>
  <organizations default="PhyEM_ORG">
    <organization identifier="PhyEM_ORG">
      <title>{}</title>
      <item identifier="ITEM_1" identifierref="RES_1">
        <title>Start PhyEM Mission</title>
      </item>
    </organization>
  </organizations>
  <resources>
    <resource identifier="RES_1" type="webcontent" adlcp:scormtype="sco" href="index.html">
      <file href="index.html" />
    </resource>
  </resources>
</manifest>"#,
        escape_xml(course_title)
    )
}
