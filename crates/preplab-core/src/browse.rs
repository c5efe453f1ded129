//! Folder-tree model for archive-based (imaging) datasets.
//!
//! Purely for browsing and preview: the tree mirrors the backend's
//! extracted structure, plus the optional path→label-file matches used to
//! badge files in the grid.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default)]
    pub file_type: String,
    #[serde(default)]
    pub size: u64,
}

impl FileEntry {
    pub fn is_image(&self) -> bool {
        self.file_type == "image"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FolderNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub children: Vec<FolderNode>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl FolderNode {
    /// True when the extracted archive produced nothing browsable.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.files.is_empty()
    }

    /// Walk to the folder at a `/`-separated path; empty path is the root.
    pub fn find(&self, path: &str) -> Option<&FolderNode> {
        let mut node = self;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            node = node.children.iter().find(|c| c.name == part)?;
        }
        Some(node)
    }

    /// Total file count in the subtree, for the restored-session summary.
    pub fn total_files(&self) -> usize {
        self.files.len() + self.children.iter().map(FolderNode::total_files).sum::<usize>()
    }
}

/// Reply to `GET /api/images/{id}/match`: image path → label file(s).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LabelMatches {
    #[serde(default)]
    pub one_to_one: HashMap<String, Value>,
    #[serde(default)]
    pub many_to_one: HashMap<String, Value>,
}

impl LabelMatches {
    pub fn has_label(&self, path: &str) -> bool {
        self.one_to_one.contains_key(path) || self.many_to_one.contains_key(path)
    }
}

/// Cumulative breadcrumb segments for a folder path:
/// `"a/b/c"` → `[("a","a"), ("b","a/b"), ("c","a/b/c")]`.
pub fn breadcrumb_parts(path: &str) -> Vec<(String, String)> {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| (part.to_string(), parts[..=i].join("/")))
        .collect()
}

/// Human file size, 1024-based.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let scaled = bytes as f64 / 1024f64.powi(exp as i32);
    format!("{:.2} {}", scaled, UNITS[exp])
        .replace(".00 ", " ")
}

/// Persisted image-session snapshot (`imageData` storage key).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ImageSession {
    #[serde(default)]
    pub folder_structure: Option<FolderNode>,
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub total_images: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> FolderNode {
        serde_json::from_value(serde_json::json!({
            "name": "",
            "path": "",
            "children": [
                {
                    "name": "patient_001",
                    "path": "patient_001",
                    "children": [
                        {
                            "name": "scans",
                            "path": "patient_001/scans",
                            "children": [],
                            "files": [
                                {"name": "scan_001.jpg", "path": "patient_001/scans/scan_001.jpg", "type": "image", "size": 2048}
                            ]
                        }
                    ],
                    "files": []
                }
            ],
            "files": [
                {"name": "labels.csv", "path": "labels.csv", "type": "csv", "size": 512}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn find_walks_nested_paths() {
        let tree = sample_tree();
        assert_eq!(tree.find("").unwrap().children.len(), 1);
        let scans = tree.find("patient_001/scans").unwrap();
        assert_eq!(scans.files[0].name, "scan_001.jpg");
        assert!(tree.find("patient_001/missing").is_none());
    }

    #[test]
    fn total_files_counts_the_subtree() {
        assert_eq!(sample_tree().total_files(), 2);
    }

    #[test]
    fn breadcrumbs_accumulate() {
        let parts = breadcrumb_parts("a/b/c");
        assert_eq!(
            parts,
            vec![
                ("a".to_string(), "a".to_string()),
                ("b".to_string(), "a/b".to_string()),
                ("c".to_string(), "a/b/c".to_string()),
            ]
        );
        assert!(breadcrumb_parts("").is_empty());
    }

    #[test]
    fn file_sizes_format_by_magnitude() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2 KB");
        assert_eq!(format_file_size(1_572_864), "1.50 MB");
    }

    #[test]
    fn matches_badge_either_direction() {
        let matches: LabelMatches = serde_json::from_value(serde_json::json!({
            "one_to_one": {"a.jpg": "a.txt"},
            "many_to_one": {"b.jpg": ["labels.csv"]}
        }))
        .unwrap();
        assert!(matches.has_label("a.jpg"));
        assert!(matches.has_label("b.jpg"));
        assert!(!matches.has_label("c.jpg"));
    }
}
