//! Merged candidate list for model selection.

use super::Resolver;
use serde::Serialize;

/// Label rendered for [`UnifiedItem::Separator`].
pub const SEPARATOR_LABEL: &str = "──────────────────────────";

/// Where a candidate name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrigin {
    /// Named in the local configuration.
    Local,
    /// Listed by the registry (live or cached).
    Remote,
    /// Previously downloaded; offered only when the registry gave nothing.
    Downloaded,
}

/// One row of the merged list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnifiedItem {
    Candidate { name: String, origin: CandidateOrigin },
    Separator,
}

impl UnifiedItem {
    fn candidate(name: impl Into<String>, origin: CandidateOrigin) -> Self {
        UnifiedItem::Candidate {
            name: name.into(),
            origin,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, UnifiedItem::Separator)
    }

    /// String handed back to the caller when this row is picked.
    ///
    /// `LOCAL:<name>` and `DOWNLOADED:<name>` mark non-registry candidates;
    /// registry entries are returned as-is. Separators can't be picked.
    pub fn selection_token(&self) -> Option<String> {
        match self {
            UnifiedItem::Candidate { name, origin } => Some(match origin {
                CandidateOrigin::Local => format!("LOCAL:{}", name),
                CandidateOrigin::Downloaded => format!("DOWNLOADED:{}", name),
                CandidateOrigin::Remote => name.clone(),
            }),
            UnifiedItem::Separator => None,
        }
    }

    /// Text shown for this row.
    pub fn label(&self) -> String {
        match self {
            UnifiedItem::Candidate { name, origin } => match origin {
                CandidateOrigin::Local => format!("[Local] {}", name),
                CandidateOrigin::Downloaded => format!("[Downloaded] {}", name),
                CandidateOrigin::Remote => name.clone(),
            },
            UnifiedItem::Separator => SEPARATOR_LABEL.to_string(),
        }
    }
}

impl Resolver {
    /// Merge configured names, registry entries for the default namespace,
    /// and downloaded names into one list.
    ///
    /// Configured names come first, followed by a separator when there are
    /// any. Registry entries follow. Names are not deduplicated across groups.
    ///
    /// Downloaded names are a stand-in only: they are listed, tagged
    /// [`CandidateOrigin::Downloaded`], when the registry group is empty, and
    /// never shown next to registry entries. Callers that want them hidden
    /// altogether pass an empty `downloaded` slice.
    pub async fn resolve_unified(
        &self,
        configured: &[String],
        downloaded: &[String],
    ) -> Vec<UnifiedItem> {
        let mut items: Vec<UnifiedItem> = configured
            .iter()
            .map(|name| UnifiedItem::candidate(name, CandidateOrigin::Local))
            .collect();
        if !items.is_empty() {
            items.push(UnifiedItem::Separator);
        }

        let remote = self.resolve_entries(&self.default_namespace).await;
        if remote.is_empty() {
            items.extend(
                downloaded
                    .iter()
                    .map(|name| UnifiedItem::candidate(name, CandidateOrigin::Downloaded)),
            );
        } else {
            items.extend(
                remote
                    .into_iter()
                    .map(|entry| UnifiedItem::candidate(entry.into_string(), CandidateOrigin::Remote)),
            );
        }

        items
    }
}
