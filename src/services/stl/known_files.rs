/// Mesh files a foot-scan export is expected to contain, five per side.
/// Extraction order follows this list.
pub const KNOWN_MESH_FILENAMES: [&str; 10] = [
    "Left_InternalStructure_Hollow.STL",
    "Left_FootShoe.STL",
    "Left_Skeleton.STL",
    "Left_Insole_Floor.STL",
    "Left_Insole_Roof.STL",
    "Right_FootShoe.STL",
    "Right_Insole_Floor.STL",
    "Right_Insole_Roof.STL",
    "Right_InternalStructure_Hollow.STL",
    "Right_Skeleton.STL",
];

/// Ordered set of entry names that may leave an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshAllowList(Vec<String>);

impl MeshAllowList {
    /// Duplicates keep their first position.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !list.contains(&name) {
                list.push(name);
            }
        }
        Self(list)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }
}

impl Default for MeshAllowList {
    fn default() -> Self {
        Self::new(KNOWN_MESH_FILENAMES)
    }
}
