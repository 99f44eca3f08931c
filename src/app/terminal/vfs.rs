use chrono::{DateTime, Local};
use indextree::{Arena, NodeId};
use thiserror::Error;
use tracing::trace;

/// Name of the root directory. Never changes, even across a reset.
pub const ROOT_NAME: &str = "~";

const DIRECTORY_SIZE: usize = 4096;

#[derive(Debug, Clone)]
pub struct VfsNode {
    pub name: String,
    pub node_type: VfsNodeType,
    pub permissions: Permissions,
    pub metadata: NodeMetadata,
}

impl VfsNode {
    fn directory(name: &str) -> Self {
        Self {
            name: name.to_string(),
            node_type: VfsNodeType::Directory,
            permissions: Permissions::directory(),
            metadata: NodeMetadata::default(),
        }
    }

    fn file(name: &str, content: String) -> Self {
        Self {
            name: name.to_string(),
            node_type: VfsNodeType::File { content },
            permissions: Permissions::file(),
            metadata: NodeMetadata::default(),
        }
    }

    /// `ls -l` style prefix: mode, owner, group, size and modification date.
    pub fn long_meta_string(&self) -> String {
        format!(
            "{}  {}  {}  {:4}  {}",
            self.permissions.symbolic(self.is_directory()),
            self.metadata.owner,
            self.metadata.group,
            self.size(),
            self.metadata.modified.format("%b %d %H:%M"),
        )
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.node_type, VfsNodeType::Directory)
    }

    pub fn content(&self) -> Option<&str> {
        match &self.node_type {
            VfsNodeType::File { content } => Some(content),
            VfsNodeType::Directory => None,
        }
    }

    /// Content length in bytes for files, a fixed block size for directories.
    pub fn size(&self) -> usize {
        match &self.node_type {
            VfsNodeType::File { content } => content.len(),
            VfsNodeType::Directory => DIRECTORY_SIZE,
        }
    }

    fn touch_modified(&mut self) {
        self.metadata.modified = Local::now();
    }
}

#[derive(Debug, Clone)]
pub enum VfsNodeType {
    Directory,
    File { content: String },
}

/// Unix style permission bits. Stored and displayed only, never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    mode: u16,
}

impl Permissions {
    pub fn file() -> Self {
        Self { mode: 0o644 }
    }

    pub fn directory() -> Self {
        Self { mode: 0o755 }
    }

    /// Parses a three digit octal mode such as `755`.
    pub fn from_octal(mode: &str) -> Result<Self, VfsError> {
        if mode.len() != 3 || !mode.chars().all(|c| ('0'..='7').contains(&c)) {
            return Err(VfsError::InvalidMode(mode.to_string()));
        }
        u16::from_str_radix(mode, 8)
            .map(|mode| Self { mode })
            .map_err(|_| VfsError::InvalidMode(mode.to_string()))
    }

    pub fn mode(&self) -> u16 {
        self.mode
    }

    pub fn symbolic(&self, is_directory: bool) -> String {
        let mut out = String::with_capacity(10);
        out.push(if is_directory { 'd' } else { '-' });
        for shift in [6u16, 3, 0] {
            let bits = (self.mode >> shift) & 0o7;
            out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub owner: String,
    pub group: String,
    pub created: DateTime<Local>,
    pub modified: DateTime<Local>,
}

impl Default for NodeMetadata {
    fn default() -> Self {
        let now = Local::now();
        Self {
            owner: "user".to_string(),
            group: "root".to_string(),
            created: now,
            modified: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    #[error("no such file or directory")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("not a directory")]
    NotADirectory,
    #[error("not a file")]
    NotAFile,
    #[error("directory not empty")]
    DirectoryNotEmpty,
    #[error("cannot move a directory into itself")]
    MoveIntoSelf,
    #[error("the root directory cannot be removed")]
    IsRoot,
    #[error("invalid mode '{0}'")]
    InvalidMode(String),
}

/// What `remove` detached from the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removed {
    File,
    Directory,
}

#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub node_id: NodeId,
    pub is_directory: bool,
}

/// The filesystem tree. Nodes live in an arena; a directory's children are
/// its subdirectories and files in insertion order, and every node keeps a
/// non-owning link to its parent.
pub struct VirtualFilesystem {
    arena: Arena<VfsNode>,
    root: NodeId,
}

impl Default for VirtualFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFilesystem {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(VfsNode::directory(ROOT_NAME));
        Self { arena, root }
    }

    pub fn get_root(&self) -> NodeId {
        self.root
    }

    pub fn get_node(&self, node: NodeId) -> Option<&VfsNode> {
        self.arena.get(node).map(|node_ref| node_ref.get())
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut VfsNode, VfsError> {
        self.arena
            .get_mut(node)
            .map(|node_ref| node_ref.get_mut())
            .ok_or(VfsError::NotFound)
    }

    pub fn get_parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node).and_then(|node_ref| node_ref.parent())
    }

    pub fn name(&self, node: NodeId) -> &str {
        self.get_node(node).map(|n| n.name.as_str()).unwrap_or_default()
    }

    fn is_directory(&self, node: NodeId) -> bool {
        self.get_node(node).is_some_and(VfsNode::is_directory)
    }

    /// Subdirectories of `dir`, in insertion order.
    pub fn subdirectories(&self, dir: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        dir.children(&self.arena)
            .filter(move |child| self.is_directory(*child))
    }

    /// Files of `dir`, in insertion order.
    pub fn files(&self, dir: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        dir.children(&self.arena)
            .filter(move |child| !self.is_directory(*child))
    }

    pub fn find_subdirectory(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.subdirectories(dir)
            .find(|child| self.name(*child) == name)
    }

    /// File lookup ignores surrounding whitespace on both the stored name and
    /// the query.
    pub fn find_file(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        let name = name.trim();
        self.files(dir)
            .find(|child| self.name(*child).trim() == name)
    }

    pub fn create_directory(&mut self, parent: NodeId, name: &str) -> Result<NodeId, VfsError> {
        if !self.is_directory(parent) {
            return Err(VfsError::NotADirectory);
        }
        if self.find_subdirectory(parent, name).is_some() {
            return Err(VfsError::AlreadyExists);
        }
        let dir_id = self.arena.new_node(VfsNode::directory(name));
        parent.append(dir_id, &mut self.arena);
        trace!(name, "created directory");
        Ok(dir_id)
    }

    pub fn create_file(
        &mut self,
        parent: NodeId,
        name: &str,
        content: String,
    ) -> Result<NodeId, VfsError> {
        if !self.is_directory(parent) {
            return Err(VfsError::NotADirectory);
        }
        if self.find_file(parent, name).is_some() {
            return Err(VfsError::AlreadyExists);
        }
        let file_id = self.arena.new_node(VfsNode::file(name, content));
        parent.append(file_id, &mut self.arena);
        trace!(name, "created file");
        Ok(file_id)
    }

    /// Overwrites the named file, creating it when absent.
    pub fn write_file(
        &mut self,
        parent: NodeId,
        name: &str,
        content: String,
    ) -> Result<NodeId, VfsError> {
        match self.find_file(parent, name) {
            Some(file_id) => {
                self.set_content(file_id, content)?;
                Ok(file_id)
            }
            None => self.create_file(parent, name, content),
        }
    }

    /// Appends a new line to the named file, creating it when absent.
    pub fn append_file(
        &mut self,
        parent: NodeId,
        name: &str,
        line: &str,
    ) -> Result<NodeId, VfsError> {
        match self.find_file(parent, name) {
            Some(file_id) => {
                let content = format!("{}\n{line}", self.read_file(file_id)?);
                self.set_content(file_id, content)?;
                Ok(file_id)
            }
            None => self.create_file(parent, name, line.to_string()),
        }
    }

    fn set_content(&mut self, file: NodeId, new_content: String) -> Result<(), VfsError> {
        let node = self.node_mut(file)?;
        match &mut node.node_type {
            VfsNodeType::File { content } => *content = new_content,
            VfsNodeType::Directory => return Err(VfsError::NotAFile),
        }
        node.touch_modified();
        Ok(())
    }

    pub fn read_file(&self, node: NodeId) -> Result<&str, VfsError> {
        self.get_node(node)
            .ok_or(VfsError::NotFound)?
            .content()
            .ok_or(VfsError::NotAFile)
    }

    /// Removes an empty subdirectory. Missing and non-empty are both errors.
    pub fn remove_empty_directory(&mut self, parent: NodeId, name: &str) -> Result<(), VfsError> {
        let dir_id = self
            .find_subdirectory(parent, name)
            .ok_or(VfsError::NotFound)?;
        if dir_id.children(&self.arena).next().is_some() {
            return Err(VfsError::DirectoryNotEmpty);
        }
        dir_id.remove_subtree(&mut self.arena);
        trace!(name, "removed empty directory");
        Ok(())
    }

    /// Removes a file, or else a whole subdirectory regardless of contents.
    pub fn remove(&mut self, parent: NodeId, name: &str) -> Result<Removed, VfsError> {
        if let Some(file_id) = self.find_file(parent, name) {
            file_id.remove_subtree(&mut self.arena);
            trace!(name, "removed file");
            return Ok(Removed::File);
        }
        if let Some(dir_id) = self.find_subdirectory(parent, name) {
            dir_id.remove_subtree(&mut self.arena);
            trace!(name, "removed directory subtree");
            return Ok(Removed::Directory);
        }
        Err(VfsError::NotFound)
    }

    /// Detaches `node` and frees it along with everything below it.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), VfsError> {
        if node == self.root {
            return Err(VfsError::IsRoot);
        }
        if self.arena.get(node).is_none() {
            return Err(VfsError::NotFound);
        }
        node.remove_subtree(&mut self.arena);
        Ok(())
    }

    /// Renames a subdirectory, or else a file. Sibling names are not checked.
    pub fn rename(&mut self, parent: NodeId, old: &str, new: &str) -> Result<NodeId, VfsError> {
        let target = self
            .find_subdirectory(parent, old)
            .or_else(|| self.find_file(parent, old))
            .ok_or(VfsError::NotFound)?;
        let node = self.node_mut(target)?;
        node.name = new.to_string();
        node.touch_modified();
        Ok(target)
    }

    pub fn set_permissions(&mut self, node: NodeId, permissions: Permissions) -> Result<(), VfsError> {
        self.node_mut(node)?.permissions = permissions;
        Ok(())
    }

    pub fn set_owner(&mut self, node: NodeId, owner: &str) -> Result<(), VfsError> {
        self.node_mut(node)?.metadata.owner = owner.to_string();
        Ok(())
    }

    /// Moves `node` to the end of `new_parent`'s children.
    pub fn move_node(&mut self, node: NodeId, new_parent: NodeId) -> Result<(), VfsError> {
        if !self.is_directory(new_parent) {
            return Err(VfsError::NotADirectory);
        }
        if new_parent.ancestors(&self.arena).any(|ancestor| ancestor == node) {
            return Err(VfsError::MoveIntoSelf);
        }
        node.detach(&mut self.arena);
        new_parent
            .checked_append(node, &mut self.arena)
            .map_err(|_| VfsError::MoveIntoSelf)
    }

    /// Deep copies `source` (file or directory) into `new_parent` under `name`.
    pub fn copy_node(
        &mut self,
        source: NodeId,
        new_parent: NodeId,
        name: &str,
    ) -> Result<NodeId, VfsError> {
        if new_parent.ancestors(&self.arena).any(|ancestor| ancestor == source) {
            return Err(VfsError::MoveIntoSelf);
        }
        let mut copy = self.get_node(source).ok_or(VfsError::NotFound)?.clone();
        let now = Local::now();
        copy.name = name.to_string();
        copy.metadata.created = now;
        copy.metadata.modified = now;
        let children: Vec<NodeId> = source.children(&self.arena).collect();
        let copy_id = self.arena.new_node(copy);
        new_parent
            .checked_append(copy_id, &mut self.arena)
            .map_err(|_| VfsError::MoveIntoSelf)?;
        for child in children {
            let child_name = self.name(child).to_string();
            self.copy_node(child, copy_id, &child_name)?;
        }
        Ok(copy_id)
    }

    /// Discards every child of `dir`, keeping `dir` itself.
    pub fn clear(&mut self, dir: NodeId) {
        let children: Vec<NodeId> = dir.children(&self.arena).collect();
        for child in children {
            child.remove_subtree(&mut self.arena);
        }
    }

    pub fn list_directory(&self, node: NodeId) -> Result<Vec<DirEntry>, VfsError> {
        if !self.is_directory(node) {
            return Err(VfsError::NotADirectory);
        }
        Ok(node
            .children(&self.arena)
            .filter_map(|child_id| {
                self.get_node(child_id).map(|child| DirEntry {
                    name: child.name.clone(),
                    node_id: child_id,
                    is_directory: child.is_directory(),
                })
            })
            .collect())
    }

    /// Total content bytes of all files below `dir`.
    pub fn subtree_size(&self, dir: NodeId) -> usize {
        dir.descendants(&self.arena)
            .filter_map(|node| self.get_node(node))
            .filter_map(VfsNode::content)
            .map(str::len)
            .sum()
    }

    /// First directory named `name` in a pre-order walk starting at `start`.
    pub fn find_directory_recursive(&self, start: NodeId, name: &str) -> Option<NodeId> {
        start
            .descendants(&self.arena)
            .find(|node| self.is_directory(*node) && self.name(*node) == name)
    }

    /// Paths of every file and directory named `name` below `start`, relative
    /// to and prefixed with `start`'s own name. Files of a directory are
    /// reported before its subdirectories.
    pub fn search(&self, start: NodeId, name: &str) -> Vec<String> {
        let mut results = Vec::new();
        self.search_into(start, name, self.name(start), &mut results);
        results
    }

    fn search_into(&self, dir: NodeId, name: &str, path: &str, results: &mut Vec<String>) {
        for file in self.files(dir) {
            if self.name(file) == name {
                results.push(format!("{path}/{name}"));
            }
        }
        for subdir in self.subdirectories(dir) {
            let subdir_path = format!("{path}/{}", self.name(subdir));
            if self.name(subdir) == name {
                results.push(subdir_path.clone());
            }
            self.search_into(subdir, name, &subdir_path, results);
        }
    }

    /// `/name` for every level from the root down to `node`, with the root's
    /// leading `/~` collapsed to `~`.
    pub fn get_node_path(&self, node: NodeId) -> String {
        let mut names: Vec<&str> = node
            .ancestors(&self.arena)
            .map(|ancestor| self.name(ancestor))
            .collect();
        names.reverse();
        names
            .iter()
            .map(|name| format!("/{name}"))
            .collect::<String>()
            .replacen("/~", "~", 1)
    }

    /// ASCII rendering of everything below `dir`; directories before files.
    pub fn render_tree(&self, dir: NodeId) -> String {
        let mut lines = Vec::new();
        self.render_tree_into(dir, "", &mut lines);
        lines.join("\n")
    }

    fn render_tree_into(&self, dir: NodeId, prefix: &str, lines: &mut Vec<String>) {
        let children: Vec<NodeId> = self.subdirectories(dir).chain(self.files(dir)).collect();
        let total = children.len();
        for (index, child) in children.into_iter().enumerate() {
            let is_last = index + 1 == total;
            let branch = if is_last { "└── " } else { "├── " };
            lines.push(format!("{prefix}{branch}{}", self.name(child)));
            if self.is_directory(child) {
                let indent = if is_last { "    " } else { "│   " };
                self.render_tree_into(child, &format!("{prefix}{indent}"), lines);
            }
        }
    }
}
