//! Human-readable renderings of the current view.
//!
//! Both views group items by last-seen environment (groups sorted by name,
//! items by type then id) and show the same fields; only the format differs.

use std::collections::BTreeMap;

use crate::item::ProjectedItem;
use crate::paths::short8;

fn group_by_env(items: &[ProjectedItem]) -> BTreeMap<&str, Vec<&ProjectedItem>> {
    let mut by_env: BTreeMap<&str, Vec<&ProjectedItem>> = BTreeMap::new();
    for item in items {
        by_env
            .entry(item.use_env_last.as_deref().unwrap_or("unknown"))
            .or_default()
            .push(item);
    }
    for group in by_env.values_mut() {
        group.sort_by(|a, b| {
            let ka = (
                a.artifact_type.as_deref().unwrap_or(""),
                a.artifact_id.as_deref().unwrap_or(""),
            );
            let kb = (
                b.artifact_type.as_deref().unwrap_or(""),
                b.artifact_id.as_deref().unwrap_or(""),
            );
            ka.cmp(&kb)
        });
    }
    by_env
}

/// Line-oriented rendering: one block per item, paths indented below it.
pub fn render_plain_text(items: &[ProjectedItem]) -> String {
    let mut lines: Vec<String> = Vec::new();

    for (env, group) in group_by_env(items) {
        lines.push(format!("ENV: {}", env));
        lines.push(String::new());

        for it in group {
            let artifact_type = it.artifact_type.as_deref().unwrap_or("");
            let mut parts = vec![format!(
                "{} | id={}",
                artifact_type,
                it.artifact_id.as_deref().unwrap_or("")
            )];
            if let Some(hash) = it.code_hash_full.as_deref().filter(|h| !h.is_empty()) {
                parts.push(format!("hash={}", short8(hash)));
            }
            if let Some(cap) = it.capability.as_deref().filter(|c| !c.is_empty()) {
                parts.push(format!("cap={}", cap));
            }
            if artifact_type == "PYN" {
                if let Some(sc) = it.sid_count {
                    parts.push(format!("sid_count={}", sc));
                }
            }
            if artifact_type == "PYN" || artifact_type == "SID" {
                if let Some(cc) = it.cid_count {
                    parts.push(format!("cid_count={}", cc));
                }
            }
            if artifact_type == "SID" {
                if let Some(seq) = it.cid_sequence.as_deref().filter(|s| !s.is_empty()) {
                    parts.push(format!("seq={}", seq));
                }
            }
            if let Some(desc) = it.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
                parts.push(format!("desc={}", desc));
            }

            lines.push(parts.join(" | "));
            lines.push(format!("  artifacts_path: {}", it.artifacts_path));
            lines.push(format!("  source_path:    {}", it.source_path));
            lines.push(format!("  explainer_path: {}", it.explainer_path));
            lines.push(String::new());
        }

        lines.push(String::new());
    }

    let mut out = lines.join("\n");
    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

/// Markdown rendering: one table per environment, fixed column order.
pub fn render_markdown(items: &[ProjectedItem], generated_at_utc: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    out.push("# Artifacts Index".to_string());
    out.push(String::new());
    out.push(format!("Generated: {}", generated_at_utc));
    out.push(String::new());

    for (env, group) in group_by_env(items) {
        out.push(format!("## ENV: {}", env));
        out.push(String::new());
        out.push(
            "| Type | ID | Hash | Capability | SID Count | CID Count | Sequence | Description | Artifacts Path | Source Path | Explainer Path |"
                .to_string(),
        );
        out.push("|---|---|---|---|---:|---:|---|---|---|---|---|".to_string());

        for it in group {
            let artifact_type = it.artifact_type.as_deref().unwrap_or("");
            let hash = short8(it.code_hash_full.as_deref().unwrap_or(""));
            let sid_count = if artifact_type == "PYN" {
                it.sid_count.map(|n| n.to_string()).unwrap_or_default()
            } else {
                String::new()
            };
            let cid_count = if artifact_type == "PYN" || artifact_type == "SID" {
                it.cid_count.map(|n| n.to_string()).unwrap_or_default()
            } else {
                String::new()
            };
            let sequence = if artifact_type == "SID" {
                it.cid_sequence.clone().unwrap_or_default()
            } else {
                String::new()
            };
            let description = it
                .description
                .as_deref()
                .unwrap_or("")
                .replace('\n', " ")
                .trim()
                .to_string();

            out.push(format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |",
                artifact_type,
                it.artifact_id.as_deref().unwrap_or(""),
                hash,
                it.capability.as_deref().unwrap_or(""),
                sid_count,
                cid_count,
                sequence,
                description,
                it.artifacts_path,
                it.source_path,
                it.explainer_path,
            ));
        }

        out.push(String::new());
    }

    let mut text = out.join("\n");
    text.truncate(text.trim_end().len());
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(artifact_type: &str, artifact_id: &str, env: Option<&str>) -> ProjectedItem {
        ProjectedItem {
            artifact_type: Some(artifact_type.to_string()),
            artifact_id: Some(artifact_id.to_string()),
            use_env_last: env.map(str::to_string),
            capability: None,
            sid_count: None,
            cid_count: None,
            cid_sequence: None,
            code_hash_full: None,
            description: None,
            source_path: format!("Raw/{}/{}.py", artifact_type, artifact_id),
            explainer_path: format!("Raw/{}/{}.explainer.md", artifact_type, artifact_id),
            artifacts_path: format!("Artifacts/{}/{}/", artifact_type, artifact_id),
        }
    }

    #[test]
    fn test_plain_text_block_layout() {
        let mut pyn = item("PYN", "P1", Some("prod"));
        pyn.sid_count = Some(2);
        pyn.cid_count = Some(5);
        pyn.code_hash_full = Some("ba7816bf8f01cfea414140de".to_string());
        pyn.description = Some("originating unit".to_string());

        let text = render_plain_text(&[pyn]);
        let expected = "\
ENV: prod

PYN | id=P1 | hash=ba7816bf | sid_count=2 | cid_count=5 | desc=originating unit
  artifacts_path: Artifacts/PYN/P1/
  source_path:    Raw/PYN/P1.py
  explainer_path: Raw/PYN/P1.explainer.md
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_plain_text_groups_sorted_by_env_then_type_id() {
        let items = vec![
            item("SID", "S1", Some("prod")),
            item("PYN", "P1", Some("dev")),
            item("CID", "C1", Some("prod")),
            item("PYN", "P2", None),
        ];
        let text = render_plain_text(&items);

        let env_positions: Vec<_> = ["ENV: dev", "ENV: prod", "ENV: unknown"]
            .iter()
            .map(|needle| text.find(needle).unwrap())
            .collect();
        assert!(env_positions[0] < env_positions[1]);
        assert!(env_positions[1] < env_positions[2]);

        // Within prod: CID before SID
        assert!(text.find("CID | id=C1").unwrap() < text.find("SID | id=S1").unwrap());
    }

    #[test]
    fn test_plain_text_omits_irrelevant_counts() {
        let mut cid = item("CID", "C1", Some("prod"));
        cid.capability = Some("render".to_string());
        cid.sid_count = Some(3);
        cid.cid_count = Some(4);

        let text = render_plain_text(&[cid]);
        assert!(text.contains("CID | id=C1 | cap=render"));
        assert!(!text.contains("sid_count"));
        assert!(!text.contains("cid_count"));
    }

    #[test]
    fn test_markdown_table_per_env() {
        let mut sid = item("SID", "S1", Some("prod"));
        sid.cid_count = Some(3);
        sid.cid_sequence = Some("a,b,c".to_string());
        sid.description = Some("multi\nline".to_string());

        let md = render_markdown(&[sid], "2026-02-01T16:05:12Z");
        assert!(md.starts_with("# Artifacts Index\n\nGenerated: 2026-02-01T16:05:12Z\n"));
        assert!(md.contains("## ENV: prod"));
        assert!(md.contains(
            "| SID | S1 |  |  |  | 3 | a,b,c | multi line | Artifacts/SID/S1/ | Raw/SID/S1.py | Raw/SID/S1.explainer.md |"
        ));
    }

    #[test]
    fn test_markdown_blank_type_specific_cells() {
        let mut cid = item("CID", "C1", Some("prod"));
        cid.capability = Some("parse".to_string());
        cid.sid_count = Some(9);
        cid.cid_count = Some(9);
        cid.cid_sequence = Some("x".to_string());

        let md = render_markdown(&[cid], "2026-02-01T16:05:12Z");
        assert!(md.contains(
            "| CID | C1 |  | parse |  |  |  |  | Artifacts/CID/C1/ | Raw/CID/C1.py | Raw/CID/C1.explainer.md |"
        ));
    }
}
