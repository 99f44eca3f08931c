use super::command::{operand, CommandRes, VfsCommand};
use super::session::Session;
use super::vfs::{VfsError, VirtualFilesystem};

pub struct CpCommand;

impl CpCommand {
    fn copy_item(
        &self,
        vfs: &mut VirtualFilesystem,
        session: &Session,
        source: &str,
        destination: &str,
    ) -> Result<(), String> {
        let dir = session.current_dir();
        if source == destination {
            return Err(format!(
                "cp: Não foi possível copiar '{source}': destino é o mesmo que a origem"
            ));
        }

        if let Some(file_id) = vfs.find_file(dir, source) {
            let content = vfs
                .read_file(file_id)
                .map_err(|err| format!("cp: {source}: {err}"))?
                .to_string();
            return vfs
                .write_file(dir, destination, content)
                .map(|_| ())
                .map_err(|err| format!("cp: {destination}: {err}"));
        }

        let dir_id = vfs.find_subdirectory(dir, source).ok_or_else(|| {
            format!("cp: Não foi possível copiar '{source}': arquivo ou diretório não encontrado")
        })?;
        if vfs.find_subdirectory(dir, destination).is_some() {
            return Err(format!(
                "cp: Não foi possível copiar '{source}': diretório de destino já existe"
            ));
        }
        vfs.copy_node(dir_id, dir, destination)
            .map(|_| ())
            .map_err(|err| format!("cp: {source}: {err}"))
    }
}

impl VfsCommand for CpCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let (source, destination) = (operand(args, 0), operand(args, 1));
        if source.is_empty() || destination.is_empty() {
            return CommandRes::new().with_stderr("cp: missing operands");
        }
        match self.copy_item(vfs, session, source, destination) {
            Ok(()) => CommandRes::new(),
            Err(err_msg) => CommandRes::new().with_stderr(err_msg),
        }
    }
}

pub struct MvCommand;

impl MvCommand {
    fn move_item(
        &self,
        vfs: &mut VirtualFilesystem,
        session: &Session,
        source: &str,
        destination: &str,
    ) -> Result<(), VfsError> {
        let dir = session.current_dir();
        let source_id = vfs
            .find_subdirectory(dir, source)
            .or_else(|| vfs.find_file(dir, source))
            .ok_or(VfsError::NotFound)?;

        // an existing subdirectory is a target to move into, anything else a new name
        match vfs.find_subdirectory(dir, destination) {
            Some(target_dir) => vfs.move_node(source_id, target_dir),
            None => vfs.rename(dir, source, destination).map(|_| ()),
        }
    }
}

impl VfsCommand for MvCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let (source, destination) = (operand(args, 0), operand(args, 1));
        if source.is_empty() || destination.is_empty() {
            return CommandRes::new().with_stderr("mv: missing operands");
        }
        match self.move_item(vfs, session, source, destination) {
            Ok(()) => CommandRes::new(),
            Err(VfsError::MoveIntoSelf) => CommandRes::new().with_stderr(format!(
                "mv: não é possível mover '{source}' para dentro de si mesmo"
            )),
            Err(_) => CommandRes::new().with_stderr(format!(
                "mv: erro ao mover '{source}': arquivo ou diretório não encontrado"
            )),
        }
    }
}
