use indextree::NodeId;

use super::command::{operand, strip_quotes, CommandRes, VfsCommand};
use super::session::Session;
use super::vfs::VirtualFilesystem;

fn read_named<'a>(vfs: &'a VirtualFilesystem, dir: NodeId, name: &str) -> Option<&'a str> {
    vfs.find_file(dir, name)
        .and_then(|file| vfs.read_file(file).ok())
}

/// Content of a file in the current directory, or the standard not-found
/// message for `cmd`.
fn read_current<'a>(
    vfs: &'a VirtualFilesystem,
    session: &Session,
    cmd: &str,
    name: &str,
) -> Result<&'a str, CommandRes> {
    read_named(vfs, session.current_dir(), name).ok_or_else(|| {
        CommandRes::new().with_stderr(format!("{cmd}: {name}: arquivo ou diretório não encontrado"))
    })
}

/// Lines split on `\n`; trailing empty lines are dropped, but empty content is
/// still one empty line.
fn content_lines(content: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = content.split('\n').collect();
    while lines.len() > 1 && lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

fn strip_trailing_quote(line: &str) -> &str {
    line.strip_suffix('"').unwrap_or(line)
}

fn parse_count(cmd: &str, count: &str) -> Result<usize, CommandRes> {
    count.parse::<usize>().map_err(|_| {
        CommandRes::new().with_stderr(format!("{cmd}: número de linhas inválido: '{count}'"))
    })
}

pub struct HeadCommand;

impl VfsCommand for HeadCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let (name, count) = (operand(args, 0), operand(args, 1));
        if name.is_empty() || count.is_empty() {
            return CommandRes::new().with_stderr("head: missing operands");
        }
        let content = match read_current(vfs, session, "head", name) {
            Ok(content) => content,
            Err(res) => return res,
        };
        let count = match parse_count("head", count) {
            Ok(count) => count,
            Err(res) => return res,
        };
        let lines = content_lines(content)
            .into_iter()
            .take(count)
            .map(strip_quotes)
            .collect::<Vec<_>>();
        CommandRes::new().with_stdout_text(lines.join("\n"))
    }
}

pub struct TailCommand;

impl VfsCommand for TailCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let (name, count) = (operand(args, 0), operand(args, 1));
        if name.is_empty() || count.is_empty() {
            return CommandRes::new().with_stderr("tail: missing operands");
        }
        let content = match read_current(vfs, session, "tail", name) {
            Ok(content) => content,
            Err(res) => return res,
        };
        let count = match parse_count("tail", count) {
            Ok(count) => count,
            Err(res) => return res,
        };
        let lines = content_lines(content);
        let start = lines.len().saturating_sub(count);
        let lines = lines[start..]
            .iter()
            .map(|line| strip_quotes(line))
            .collect::<Vec<_>>();
        CommandRes::new().with_stdout_text(lines.join("\n"))
    }
}

pub struct WcCommand;

impl VfsCommand for WcCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let name = operand(args, 0);
        if name.is_empty() {
            return CommandRes::new().with_stderr("wc: missing operand");
        }
        let content = match read_current(vfs, session, "wc", name) {
            Ok(content) => strip_quotes(content),
            Err(res) => return res,
        };
        let lines = content.lines().count();
        let words = content.split_whitespace().count();
        let chars = content.chars().count();
        CommandRes::new().with_stdout_text(format!("{lines} {words} {chars} {name}"))
    }
}

pub struct GrepCommand;

impl VfsCommand for GrepCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let (term, name) = (operand(args, 0), operand(args, 1));
        if term.is_empty() || name.is_empty() {
            return CommandRes::new().with_stderr("grep: missing operands");
        }
        let content = match read_current(vfs, session, "grep", name) {
            Ok(content) => content,
            Err(res) => return res,
        };
        let term = strip_quotes(term);
        let matches = content
            .split('\n')
            .filter(|line| line.contains(term))
            .collect::<Vec<_>>();
        if matches.is_empty() {
            CommandRes::new()
                .with_stdout_text(format!("grep: Nenhuma correspondência encontrada para '{term}'"))
        } else {
            CommandRes::new().with_stdout_text(matches.join("\n"))
        }
    }
}

pub struct DiffCommand;

impl VfsCommand for DiffCommand {
    fn execute(&self, vfs: &mut VirtualFilesystem, session: &mut Session, args: &[&str]) -> CommandRes {
        let (first, second) = (operand(args, 0), operand(args, 1));
        if first.is_empty() || second.is_empty() {
            return CommandRes::new().with_stderr("diff: missing operands");
        }
        let dir = session.current_dir();
        let vfs: &VirtualFilesystem = vfs;
        let (Some(left), Some(right)) = (read_named(vfs, dir, first), read_named(vfs, dir, second))
        else {
            return CommandRes::new().with_stderr(format!(
                "diff: Não foi possível comparar '{first}' e '{second}': arquivo não encontrado"
            ));
        };

        let (left, right) = (content_lines(left), content_lines(right));
        let line_at = |lines: &[&str], index: usize| {
            lines.get(index).copied().map(strip_trailing_quote).unwrap_or_default().to_string()
        };
        let differences = (0..left.len().max(right.len()))
            .filter_map(|index| {
                let (a, b) = (line_at(&left, index), line_at(&right, index));
                (a != b).then(|| format!("< {a}\n> {b}"))
            })
            .collect::<Vec<_>>();

        if differences.is_empty() {
            CommandRes::new().with_stdout_text("Nenhuma diferença encontrada")
        } else {
            CommandRes::new().with_stdout_text(differences.join("\n").trim_end())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(files: &[(&str, &str)]) -> (VirtualFilesystem, Session) {
        let mut vfs = VirtualFilesystem::new();
        let root = vfs.get_root();
        for (name, content) in files {
            vfs.create_file(root, name, content.to_string()).unwrap();
        }
        let session = Session::new(&vfs);
        (vfs, session)
    }

    #[test]
    fn test_head_and_tail() {
        let (mut vfs, mut session) = setup(&[("log", "\"one\"\ntwo\nthree\nfour\n")]);
        let res = HeadCommand.execute(&mut vfs, &mut session, &["log", "2"]);
        assert_eq!(res.text(), "one\ntwo");
        let res = TailCommand.execute(&mut vfs, &mut session, &["log", "2"]);
        assert_eq!(res.text(), "three\nfour");
        let res = TailCommand.execute(&mut vfs, &mut session, &["log", "10"]);
        assert_eq!(res.text(), "one\ntwo\nthree\nfour");
        let res = HeadCommand.execute(&mut vfs, &mut session, &["log", "0"]);
        assert_eq!(res.text(), "");
    }

    #[test]
    fn test_head_errors() {
        let (mut vfs, mut session) = setup(&[("log", "a")]);
        let res = HeadCommand.execute(&mut vfs, &mut session, &["log", "many"]);
        assert!(res.is_error());
        assert_eq!(res.text(), "head: número de linhas inválido: 'many'");
        let res = TailCommand.execute(&mut vfs, &mut session, &["nope", "1"]);
        assert_eq!(res.text(), "tail: nope: arquivo ou diretório não encontrado");
        let res = HeadCommand.execute(&mut vfs, &mut session, &["log"]);
        assert_eq!(res.text(), "head: missing operands");
    }

    #[test]
    fn test_wc_counts() {
        let (mut vfs, mut session) = setup(&[("poem", "\"olá mundo\nsegunda linha\"")]);
        let res = WcCommand.execute(&mut vfs, &mut session, &["poem"]);
        assert_eq!(res.text(), "2 4 23 poem");
        let res = WcCommand.execute(&mut vfs, &mut session, &["missing"]);
        assert_eq!(res.text(), "wc: missing: arquivo ou diretório não encontrado");
    }

    #[test]
    fn test_grep() {
        let (mut vfs, mut session) = setup(&[("notes", "rust is fun\njava\ntrust me")]);
        let res = GrepCommand.execute(&mut vfs, &mut session, &["\"rust\"", "notes"]);
        assert_eq!(res.text(), "rust is fun\ntrust me");
        let res = GrepCommand.execute(&mut vfs, &mut session, &["go", "notes"]);
        assert!(!res.is_error());
        assert_eq!(res.text(), "grep: Nenhuma correspondência encontrada para 'go'");
    }

    #[test]
    fn test_diff() {
        let (mut vfs, mut session) = setup(&[
            ("a", "same\nleft\"\nonly"),
            ("b", "same\nright"),
            ("c", "same\nleft"),
        ]);
        let res = DiffCommand.execute(&mut vfs, &mut session, &["a", "b"]);
        assert_eq!(res.text(), "< left\n> right\n< only\n>");
        let res = DiffCommand.execute(&mut vfs, &mut session, &["c", "c"]);
        assert_eq!(res.text(), "Nenhuma diferença encontrada");
        let res = DiffCommand.execute(&mut vfs, &mut session, &["a", "zzz"]);
        assert!(res.is_error());
        assert_eq!(
            res.text(),
            "diff: Não foi possível comparar 'a' e 'zzz': arquivo não encontrado"
        );
    }
}
