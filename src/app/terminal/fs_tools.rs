use indextree::NodeId;

use super::command::{operand, strip_quotes, CommandRes, VfsCommand};
use super::components::{columnar_text, COLUMNS, COLUMN_WIDTH};
use super::session::Session;
use super::vfs::{Permissions, Removed, VfsError, VirtualFilesystem, ROOT_NAME};

pub struct MkdirCommand;

impl VfsCommand for MkdirCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let name = operand(args, 0);
        if name.is_empty() {
            return CommandRes::new().with_stderr("mkdir: missing operand");
        }
        match vfs.create_directory(session.current_dir(), name) {
            Ok(_) => CommandRes::new()
                .with_stdout_text(format!("mkdir: Diretório '{name}' criado com sucesso")),
            Err(_) => CommandRes::new().with_stderr("mkdir: O diretório já existe"),
        }
    }
}

pub struct RmdirCommand;

impl VfsCommand for RmdirCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let name = operand(args, 0);
        if name.is_empty() {
            return CommandRes::new().with_stderr("rmdir: missing operand");
        }
        match vfs.remove_empty_directory(session.current_dir(), name) {
            Ok(()) => CommandRes::new().with_stdout_text(format!("rmdir: '{name}' removido")),
            Err(_) => CommandRes::new().with_stderr(format!(
                "rmdir: Falha ao remover '{name}': diretório não está vazio ou não existe"
            )),
        }
    }
}

pub struct TouchCommand;

impl VfsCommand for TouchCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let name = operand(args, 0);
        if name.is_empty() {
            return CommandRes::new().with_stderr("touch: missing operand");
        }
        match vfs.create_file(session.current_dir(), name, String::new()) {
            Ok(_) => CommandRes::new().with_stdout_text(format!("touch: Arquivo '{name}' criado")),
            // touching an existing file changes nothing and prints nothing
            Err(VfsError::AlreadyExists) => CommandRes::new(),
            Err(err) => CommandRes::new().with_stderr(format!("touch: {name}: {err}")),
        }
    }
}

pub struct CatCommand;

impl VfsCommand for CatCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let name = operand(args, 0);
        if name.is_empty() {
            return CommandRes::new().with_stderr("cat: missing operand");
        }
        let content = vfs
            .find_file(session.current_dir(), name)
            .and_then(|file| vfs.read_file(file).ok());
        match content {
            Some(content) => CommandRes::new().with_stdout_text(content),
            None => CommandRes::new().with_stderr(format!("cat: {name}: arquivo não encontrado")),
        }
    }
}

pub struct RmCommand;

impl VfsCommand for RmCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let name = operand(args, 0);
        if name.is_empty() {
            return CommandRes::new().with_stderr("rm: missing operand");
        }
        match vfs.remove(session.current_dir(), name) {
            Ok(Removed::File) => {
                CommandRes::new().with_stdout_text(format!("rm: Arquivo '{name}' removido."))
            }
            Ok(Removed::Directory) => {
                CommandRes::new().with_stdout_text(format!("rm: Diretório '{name}' removido."))
            }
            Err(_) => CommandRes::new().with_stderr(format!("rm: '{name}' não encontrado.")),
        }
    }
}

pub struct CdCommand;

impl VfsCommand for CdCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let target = operand(args, 0);
        if target.is_empty() {
            return CommandRes::new().with_stderr("cd: missing operand");
        }
        match session.change_directory(vfs, target) {
            Ok(()) => CommandRes::new(),
            Err(_) => CommandRes::new().with_stderr(format!("cd: '{target}' não encontrado")),
        }
    }
}

pub struct RenameCommand;

impl VfsCommand for RenameCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let (old, new) = (operand(args, 0), operand(args, 1));
        if old.is_empty() || new.is_empty() {
            return CommandRes::new().with_stderr("rename: missing operands");
        }
        match vfs.rename(session.current_dir(), old, new) {
            Ok(_) => {
                CommandRes::new().with_stdout_text(format!("rename: '{old}' renomeado para '{new}'"))
            }
            Err(_) => CommandRes::new()
                .with_stderr(format!("rename: Não existe arquivo ou diretório '{old}'")),
        }
    }
}

pub struct TreeCommand;

impl VfsCommand for TreeCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, _args: &[&str]) -> CommandRes {
        CommandRes::new().with_stdout_text(vfs.render_tree(session.current_dir()))
    }
}

pub struct LsCommand;

impl VfsCommand for LsCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let long_format = operand(args, 0) == "-l";
        let mut entries = match vfs.list_directory(session.current_dir()) {
            Ok(entries) => entries,
            Err(err) => return CommandRes::new().with_stderr(format!("ls: {err}")),
        };
        // directories first, each group by name
        entries.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then_with(|| a.name.cmp(&b.name))
        });

        if long_format {
            let lines = entries
                .iter()
                .filter_map(|entry| {
                    let node = vfs.get_node(entry.node_id)?;
                    let suffix = if entry.is_directory { "/" } else { "" };
                    Some(format!("{}  {}{suffix}", node.long_meta_string(), entry.name))
                })
                .collect::<Vec<_>>();
            return CommandRes::new().with_stdout_text(lines.join("\n"));
        }

        let items = entries
            .into_iter()
            .map(|entry| {
                if entry.is_directory {
                    format!("{}/", entry.name)
                } else {
                    entry.name
                }
            })
            .collect::<Vec<_>>();
        CommandRes::new().with_stdout_text(columnar_text(&items, COLUMN_WIDTH, COLUMNS))
    }
}

/// Resolves a name in the current directory, file first.
fn lookup_any(vfs: &VirtualFilesystem, dir: NodeId, name: &str) -> Option<NodeId> {
    vfs.find_file(dir, name)
        .or_else(|| vfs.find_subdirectory(dir, name))
}

pub struct StatCommand;

impl VfsCommand for StatCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let name = operand(args, 0);
        if name.is_empty() {
            return CommandRes::new().with_stderr("stat: missing operand");
        }
        let dir = session.current_dir();
        let Some(node_id) = lookup_any(vfs, dir, name) else {
            return CommandRes::new().with_stderr(format!(
                "stat: não foi possível acessar '{name}': arquivo ou diretório não encontrado"
            ));
        };
        let Some(node) = vfs.get_node(node_id) else {
            return CommandRes::new().with_stderr(format!("stat: {name}: {}", VfsError::NotFound));
        };

        let header = if node.is_directory() {
            format!(
                "Directory: {name}\nSubdirectories: {}\nFiles: {}",
                vfs.subdirectories(node_id).count(),
                vfs.files(node_id).count()
            )
        } else {
            format!("File: {name}\nSize: {} bytes", node.size())
        };
        let text = format!(
            "{header}\nAccess: ({:o}/{})\nOwner: {}  Group: {}\nCreated: {}\nModified: {}",
            node.permissions.mode(),
            node.permissions.symbolic(node.is_directory()),
            node.metadata.owner,
            node.metadata.group,
            node.metadata.created.format("%Y-%m-%d %H:%M:%S"),
            node.metadata.modified.format("%Y-%m-%d %H:%M:%S"),
        );
        CommandRes::new().with_stdout_text(text)
    }
}

pub struct DuCommand;

impl VfsCommand for DuCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let name = operand(args, 0);
        if name.is_empty() {
            return CommandRes::new().with_stderr("du: missing operand");
        }
        let target = if name == "." {
            Some(session.current_dir())
        } else {
            vfs.find_subdirectory(session.current_dir(), name)
        };
        match target {
            Some(dir) => CommandRes::new()
                .with_stdout_text(format!("Tamanho do diretório: {} bytes", vfs.subtree_size(dir))),
            None => CommandRes::new().with_stderr(format!(
                "du: não foi possível acessar '{name}': arquivo ou diretório não encontrado"
            )),
        }
    }
}

pub struct FindCommand;

impl VfsCommand for FindCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let (start, flag, pattern) = (operand(args, 0), operand(args, 1), operand(args, 2));
        if start.is_empty() || flag != "-name" || pattern.is_empty() {
            return CommandRes::new().with_stderr(
                "find: sintaxe inválida. Uso correto: find <diretório> -name <nome>",
            );
        }
        let search_root = match start {
            ROOT_NAME | "/" => Some(vfs.get_root()),
            "." => Some(session.current_dir()),
            name => vfs.find_directory_recursive(vfs.get_root(), name),
        };
        let Some(search_root) = search_root else {
            return CommandRes::new().with_stderr(format!("find: diretório não encontrado: {start}"));
        };

        let results = vfs.search(search_root, strip_quotes(pattern));
        if results.is_empty() {
            CommandRes::new().with_stdout_text("find: Nenhum arquivo correspondente encontrado")
        } else {
            CommandRes::new().with_stdout_text(results.join("\n"))
        }
    }
}

pub struct ChmodCommand;

impl VfsCommand for ChmodCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let (mode, name) = (operand(args, 0), operand(args, 1));
        if mode.is_empty() || name.is_empty() {
            return CommandRes::new().with_stderr("chmod: missing operands");
        }
        let permissions = match Permissions::from_octal(mode) {
            Ok(permissions) => permissions,
            Err(_) => return CommandRes::new().with_stderr(format!("chmod: modo inválido: '{mode}'")),
        };
        let result = lookup_any(vfs, session.current_dir(), name)
            .ok_or(VfsError::NotFound)
            .and_then(|node| vfs.set_permissions(node, permissions));
        match result {
            Ok(()) => CommandRes::new(),
            Err(_) => CommandRes::new().with_stderr(format!(
                "chmod: não foi possível acessar '{name}': arquivo ou diretório não encontrado"
            )),
        }
    }
}

pub struct ChownCommand;

impl VfsCommand for ChownCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let (owner, name) = (operand(args, 0), operand(args, 1));
        if owner.is_empty() || name.is_empty() {
            return CommandRes::new().with_stderr("chown: missing operands");
        }
        let result = lookup_any(vfs, session.current_dir(), name)
            .ok_or(VfsError::NotFound)
            .and_then(|node| vfs.set_owner(node, owner));
        match result {
            Ok(()) => CommandRes::new(),
            Err(_) => CommandRes::new().with_stderr(format!(
                "chown: não foi possível acessar '{name}': arquivo ou diretório não encontrado"
            )),
        }
    }
}
