use indextree::NodeId;
use tracing::debug;

use super::vfs::{VfsError, VirtualFilesystem, ROOT_NAME};

/// Where a terminal is positioned in its tree, plus everything typed so far.
#[derive(Debug, Clone)]
pub struct Session {
    current_dir: NodeId,
    history: Vec<String>,
}

impl Session {
    pub fn new(vfs: &VirtualFilesystem) -> Self {
        Self {
            current_dir: vfs.get_root(),
            history: Vec::new(),
        }
    }

    pub fn current_dir(&self) -> NodeId {
        self.current_dir
    }

    pub fn current_path(&self, vfs: &VirtualFilesystem) -> String {
        vfs.get_node_path(self.current_dir)
    }

    /// `~` goes to the root and `..` to the parent (a no-op at the root); any
    /// other value must name a subdirectory of the current directory.
    pub fn change_directory(&mut self, vfs: &VirtualFilesystem, target: &str) -> Result<(), VfsError> {
        match target {
            ROOT_NAME => self.current_dir = vfs.get_root(),
            ".." => {
                if let Some(parent) = vfs.get_parent(self.current_dir) {
                    self.current_dir = parent;
                }
            }
            name => {
                self.current_dir = vfs
                    .find_subdirectory(self.current_dir, name)
                    .ok_or(VfsError::NotFound)?;
            }
        }
        Ok(())
    }

    pub fn record(&mut self, line: &str) {
        self.history.push(line.to_string());
    }

    pub fn history(&self) -> String {
        self.history.join("\n")
    }

    /// Back to the initial state: an empty root, no history.
    pub fn reset(&mut self, vfs: &mut VirtualFilesystem) {
        let root = vfs.get_root();
        self.current_dir = root;
        vfs.clear(root);
        self.history.clear();
        debug!("session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cd_up_at_root_is_noop() {
        let vfs = VirtualFilesystem::new();
        let mut session = Session::new(&vfs);
        assert!(session.change_directory(&vfs, "..").is_ok());
        assert_eq!(session.current_dir(), vfs.get_root());
        assert_eq!(session.current_path(&vfs), "~");
    }

    #[test]
    fn test_cd_into_and_out_of_directories() {
        let mut vfs = VirtualFilesystem::new();
        let root = vfs.get_root();
        let a = vfs.create_directory(root, "a").unwrap();
        vfs.create_directory(a, "b").unwrap();
        let mut session = Session::new(&vfs);

        session.change_directory(&vfs, "a").unwrap();
        session.change_directory(&vfs, "b").unwrap();
        assert_eq!(session.current_path(&vfs), "~/a/b");

        session.change_directory(&vfs, "..").unwrap();
        assert_eq!(session.current_dir(), a);

        session.change_directory(&vfs, "~").unwrap();
        assert_eq!(session.current_dir(), root);
    }

    #[test]
    fn test_cd_has_no_multi_segment_paths() {
        let mut vfs = VirtualFilesystem::new();
        let root = vfs.get_root();
        let a = vfs.create_directory(root, "a").unwrap();
        vfs.create_directory(a, "b").unwrap();
        let mut session = Session::new(&vfs);

        assert_eq!(session.change_directory(&vfs, "a/b"), Err(VfsError::NotFound));
        assert_eq!(session.change_directory(&vfs, "/"), Err(VfsError::NotFound));
        assert_eq!(session.current_dir(), root);
    }

    #[test]
    fn test_history_and_reset() {
        let mut vfs = VirtualFilesystem::new();
        let root = vfs.get_root();
        let a = vfs.create_directory(root, "a").unwrap();
        let mut session = Session::new(&vfs);
        session.record("mkdir a");
        session.record("mkdir a");
        session.record("cd a");
        session.change_directory(&vfs, "a").unwrap();
        assert_eq!(session.current_dir(), a);
        assert_eq!(session.history(), "mkdir a\nmkdir a\ncd a");

        session.reset(&mut vfs);
        assert_eq!(session.current_dir(), root);
        assert_eq!(session.history(), "");
        assert_eq!(vfs.render_tree(root), "");
    }
}
