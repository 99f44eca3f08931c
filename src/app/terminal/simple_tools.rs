use super::command::{operand, strip_quotes, CommandRes, VfsCommand};
use super::session::Session;
use super::vfs::VirtualFilesystem;

const HELP_TEXT: &str = "Comandos disponíveis:
  - pwd: Exibe o caminho atual do diretório
  - mkdir [dir]: Cria um novo diretório
  - rmdir [dir]: Remove um diretório vazio
  - tree: Exibe a estrutura hierárquica de diretórios
  - rename [nome_atual] [novo_nome]: Renomeia um arquivo ou diretório
  - touch [arquivo]: Cria um arquivo vazio
  - echo [texto]: Exibe o texto informado
  - cat [arquivo]: Exibe o conteúdo de um arquivo
  - rm [arquivo]: Remove um arquivo ou diretório
  - head [arquivo] [n]: Exibe as primeiras n linhas de um arquivo
  - tail [arquivo] [n]: Exibe as últimas n linhas de um arquivo
  - wc [arquivo]: Conta linhas, palavras e caracteres de um arquivo
  - ls [-l]: Lista arquivos e diretórios
  - cd [dir]: Muda para o diretório especificado
  - find [dir] -name [nome]: Busca arquivos por nome
  - grep [termo] [arquivo]: Procura por um termo dentro de um arquivo
  - chmod [permissão] [arquivo]: Modifica permissões de um arquivo (simulado)
  - chown [dono] [arquivo]: Modifica o dono de um arquivo (simulado)
  - stat [arquivo]: Exibe informações detalhadas sobre um arquivo
  - du [diretório]: Exibe o tamanho total de um diretório
  - cp [origem] [destino]: Copia arquivos ou diretórios
  - mv [origem] [destino]: Move arquivos ou diretórios
  - diff [arquivo1] [arquivo2]: Compara dois arquivos e exibe as diferenças
  - zip [arquivo.zip] [itens]: Realiza a compactação de arquivos
  - unzip [arquivo.zip]: Realiza a extração de um arquivo ZIP
  - history: Exibe o histórico de comandos digitados
  - exit: Encerra a sessão do terminal e reseta os dados
";

pub struct HelpCommand;

impl VfsCommand for HelpCommand {
    fn execute(&self, _vfs: &mut VirtualFilesystem, _session: &mut Session, _args: &[&str]) -> CommandRes {
        CommandRes::new().with_stdout_text(HELP_TEXT)
    }
}

pub struct PwdCommand;

impl VfsCommand for PwdCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, _args: &[&str]) -> CommandRes {
        CommandRes::new().with_stdout_text(session.current_path(vfs))
    }
}

pub struct HistoryCommand;

impl VfsCommand for HistoryCommand {
    fn execute(&self, _vfs: &mut VirtualFilesystem, session: &mut Session, _args: &[&str]) -> CommandRes {
        CommandRes::new().with_stdout_text(session.history())
    }
}

/// Prints its whole argument minus one surrounding quote on each side. With
/// `redirect` set, `text > file` overwrites and `text >> file` appends a line.
pub struct EchoCommand {
    redirect: bool,
}

impl EchoCommand {
    pub fn new(redirect: bool) -> Self {
        Self { redirect }
    }

    fn write_to_file(
        &self,
        vfs: &mut VirtualFilesystem,
        session: &Session,
        text: &str,
    ) -> Option<CommandRes> {
        let (append, (content, target)) = match text.split_once(">>") {
            Some(parts) => (true, parts),
            None => (false, text.split_once('>')?),
        };
        let (content, target) = (strip_quotes(content.trim()), target.trim());
        if target.is_empty() {
            return Some(CommandRes::new().with_stderr("echo: syntax error"));
        }

        let dir = session.current_dir();
        let result = if append {
            vfs.append_file(dir, target, content)
        } else {
            vfs.write_file(dir, target, content.to_string())
        };
        Some(match result {
            Ok(_) => CommandRes::new(),
            Err(err) => CommandRes::new().with_stderr(format!("echo: {target}: {err}")),
        })
    }
}

impl VfsCommand for EchoCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let text = strip_quotes(operand(args, 0));
        if self.redirect {
            if let Some(res) = self.write_to_file(vfs, session, text) {
                return res;
            }
        }
        CommandRes::new().with_stdout_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (VirtualFilesystem, Session) {
        let vfs = VirtualFilesystem::new();
        let session = Session::new(&vfs);
        (vfs, session)
    }

    #[test]
    fn test_echo_strips_one_quote_each_side() {
        let (mut vfs, mut session) = setup();
        let echo = EchoCommand::new(false);
        let res = echo.execute(&mut vfs, &mut session, &["\"hello  world\""]);
        assert_eq!(res.text(), "hello  world");
        let res = echo.execute(&mut vfs, &mut session, &["\"\"x\"\""]);
        assert_eq!(res.text(), "\"x\"");
        let res = echo.execute(&mut vfs, &mut session, &[]);
        assert_eq!(res.text(), "");
    }

    #[test]
    fn test_echo_never_writes_without_redirect() {
        let (mut vfs, mut session) = setup();
        let res = EchoCommand::new(false).execute(&mut vfs, &mut session, &["hi > out.txt"]);
        assert_eq!(res.text(), "hi > out.txt");
        assert_eq!(vfs.files(vfs.get_root()).count(), 0);
    }

    #[test]
    fn test_echo_redirect_overwrites_and_appends() {
        let (mut vfs, mut session) = setup();
        let root = vfs.get_root();
        let echo = EchoCommand::new(true);

        let res = echo.execute(&mut vfs, &mut session, &["\"first\" > out.txt"]);
        assert_eq!(res, CommandRes::new());
        let out = vfs.find_file(root, "out.txt").unwrap();
        assert_eq!(vfs.read_file(out), Ok("first"));

        echo.execute(&mut vfs, &mut session, &["second >> out.txt"]);
        assert_eq!(vfs.read_file(out), Ok("first\nsecond"));

        echo.execute(&mut vfs, &mut session, &["third > out.txt"]);
        assert_eq!(vfs.read_file(out), Ok("third"));

        let res = echo.execute(&mut vfs, &mut session, &["oops >"]);
        assert_eq!(res.text(), "echo: syntax error");
        let res = echo.execute(&mut vfs, &mut session, &["plain"]);
        assert_eq!(res.text(), "plain");
    }

    #[test]
    fn test_pwd_history_help() {
        let (mut vfs, mut session) = setup();
        let res = PwdCommand.execute(&mut vfs, &mut session, &[]);
        assert_eq!(res.text(), "~");

        session.record("pwd");
        session.record("bogus");
        let res = HistoryCommand.execute(&mut vfs, &mut session, &[]);
        assert_eq!(res.text(), "pwd\nbogus");

        let first = HelpCommand.execute(&mut vfs, &mut session, &[]);
        let second = HelpCommand.execute(&mut vfs, &mut session, &["extra"]);
        assert_eq!(first, second);
        assert!(first.text().starts_with("Comandos disponíveis:"));
    }
}
