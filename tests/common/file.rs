use derive_new::new;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Eq, PartialEq, new)]
pub struct FileSpec {
    pub path: PathBuf,
    pub content: String,
}

pub fn write_file(file_spec: &FileSpec) {
    // make sure the parent directory exists
    if let Some(parent) = file_spec.path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("Failed to create directory {:?}: {}", parent, e));
    }

    std::fs::write(&file_spec.path, &file_spec.content)
        .unwrap_or_else(|e| panic!("Failed to write file {:?}: {}", file_spec.path, e));
}

/// A few random words, newline terminated
pub fn random_content() -> String {
    use fake::Fake;
    use fake::faker::lorem::en::Words;

    format!("{}\n", Words(5..10).fake::<Vec<String>>().join(" "))
}

/// Write an executable shell script
pub fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    write_file(&FileSpec::new(
        path.to_path_buf(),
        format!("#!/bin/sh\n{body}\n"),
    ));
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .unwrap_or_else(|e| panic!("Failed to make {:?} executable: {}", path, e));
}
