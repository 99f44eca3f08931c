use indextree::NodeId;
use tracing::{trace, warn};

use super::command::{operand, strip_quotes, CommandRes, VfsCommand};
use super::session::Session;
use super::vfs::{VfsError, VirtualFilesystem};

const ARCHIVE_SUFFIX: &str = ".zip";

fn archive_name(name: &str) -> String {
    if name.ends_with(ARCHIVE_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{ARCHIVE_SUFFIX}")
    }
}

/// Copies the named files of `dir` into a new `<name>.zip` directory. The
/// archive is a plain directory; nothing is compressed.
pub struct ZipCommand;

impl ZipCommand {
    fn pack(
        &self,
        vfs: &mut VirtualFilesystem,
        dir: NodeId,
        archive: &str,
        members: &[&str],
    ) -> Result<usize, VfsError> {
        let sources = members
            .iter()
            .filter_map(|member| {
                let found = vfs.find_file(dir, member);
                if found.is_none() {
                    warn!(member, "zip: skipping missing file");
                }
                found
            })
            .filter_map(|file| {
                let name = vfs.name(file).to_string();
                vfs.read_file(file).ok().map(|content| (name, content.to_string()))
            })
            .collect::<Vec<_>>();
        if sources.is_empty() {
            return Ok(0);
        }

        let archive_id = vfs.create_directory(dir, archive)?;
        for (name, content) in &sources {
            vfs.write_file(archive_id, name, content.clone())?;
            trace!(name, archive, "packed file");
        }
        Ok(sources.len())
    }
}

impl VfsCommand for ZipCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let name = operand(args, 0);
        let members = args
            .iter()
            .skip(1)
            .map(|member| strip_quotes(member).trim())
            .filter(|member| !member.is_empty())
            .collect::<Vec<_>>();
        if name.is_empty() || members.is_empty() {
            return CommandRes::new().with_stderr("zip: missing operand");
        }

        let archive = archive_name(name);
        match self.pack(vfs, session.current_dir(), &archive, &members) {
            Ok(0) => CommandRes::new().with_stderr("zip: Nenhum arquivo válido encontrado."),
            Ok(_) => {
                CommandRes::new().with_stdout_text(format!("zip: Arquivos compactados em '{archive}'"))
            }
            Err(VfsError::AlreadyExists) => {
                CommandRes::new().with_stderr(format!("zip: '{archive}' já existe"))
            }
            Err(err) => CommandRes::new().with_stderr(format!("zip: {archive}: {err}")),
        }
    }
}

/// Copies every file of `<name>.zip` into the current directory, replacing
/// files of the same name, then removes the archive.
pub struct UnzipCommand;

impl UnzipCommand {
    fn unpack(&self, vfs: &mut VirtualFilesystem, dir: NodeId, archive_id: NodeId) -> Result<usize, VfsError> {
        let members = vfs
            .files(archive_id)
            .filter_map(|file| {
                let name = vfs.name(file).to_string();
                vfs.read_file(file).ok().map(|content| (name, content.to_string()))
            })
            .collect::<Vec<_>>();
        for (name, content) in &members {
            vfs.write_file(dir, name, content.clone())?;
        }
        vfs.remove_node(archive_id)?;
        Ok(members.len())
    }
}

impl VfsCommand for UnzipCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let name = operand(args, 0);
        if name.is_empty() {
            return CommandRes::new().with_stderr("unzip: missing operand");
        }
        let archive = archive_name(name);
        let dir = session.current_dir();
        let Some(archive_id) = vfs.find_subdirectory(dir, &archive) else {
            return CommandRes::new()
                .with_stderr(format!("unzip: não foi possível encontrar '{archive}'"));
        };
        match self.unpack(vfs, dir, archive_id) {
            Ok(count) => CommandRes::new()
                .with_stdout_text(format!("unzip: {count} arquivo(s) extraído(s) de {archive}")),
            Err(err) => CommandRes::new().with_stderr(format!("unzip: {archive}: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (VirtualFilesystem, Session) {
        let mut vfs = VirtualFilesystem::new();
        let root = vfs.get_root();
        vfs.create_file(root, "a.txt", "alpha".to_string()).unwrap();
        vfs.create_file(root, "b.txt", "beta".to_string()).unwrap();
        let session = Session::new(&vfs);
        (vfs, session)
    }

    #[test]
    fn test_zip_copies_existing_files() {
        let (mut vfs, mut session) = setup();
        let root = vfs.get_root();
        let res = ZipCommand.execute(&mut vfs, &mut session, &["bundle", "a.txt", "missing", "\"b.txt\""]);
        assert_eq!(res.text(), "zip: Arquivos compactados em 'bundle.zip'");

        let archive = vfs.find_subdirectory(root, "bundle.zip").unwrap();
        assert_eq!(vfs.files(archive).count(), 2);
        // originals stay in place
        assert_eq!(vfs.files(root).count(), 2);

        let res = ZipCommand.execute(&mut vfs, &mut session, &["bundle.zip", "a.txt"]);
        assert!(res.is_error());
        assert_eq!(res.text(), "zip: 'bundle.zip' já existe");
    }

    #[test]
    fn test_zip_without_valid_files() {
        let (mut vfs, mut session) = setup();
        let res = ZipCommand.execute(&mut vfs, &mut session, &["empty", "ghost"]);
        assert_eq!(res.text(), "zip: Nenhum arquivo válido encontrado.");
        assert!(vfs.find_subdirectory(vfs.get_root(), "empty.zip").is_none());

        let res = ZipCommand.execute(&mut vfs, &mut session, &["only-name"]);
        assert_eq!(res.text(), "zip: missing operand");
    }

    #[test]
    fn test_unzip_restores_and_removes_archive() {
        let (mut vfs, mut session) = setup();
        let root = vfs.get_root();
        ZipCommand.execute(&mut vfs, &mut session, &["bundle", "a.txt", "b.txt"]);
        vfs.remove(root, "a.txt").unwrap();
        let b = vfs.find_file(root, "b.txt").unwrap();
        vfs.write_file(root, "b.txt", "changed".to_string()).unwrap();

        let res = UnzipCommand.execute(&mut vfs, &mut session, &["bundle"]);
        assert_eq!(res.text(), "unzip: 2 arquivo(s) extraído(s) de bundle.zip");
        assert!(vfs.find_subdirectory(root, "bundle.zip").is_none());
        assert_eq!(vfs.read_file(b), Ok("beta"));
        assert!(vfs.find_file(root, "a.txt").is_some());

        let res = UnzipCommand.execute(&mut vfs, &mut session, &["bundle"]);
        assert_eq!(res.text(), "unzip: não foi possível encontrar 'bundle.zip'");
    }
}
