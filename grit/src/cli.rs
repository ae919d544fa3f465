use clap::{Parser, Subcommand};
use libgrit::commit::Identity;
use libgrit::obj::ObjKind;
use libgrit::{config, GritResult, Repository};
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author = "Andy Yu <andyyu2004@gmail.com>")]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCmd,
    /// run as if started in `<path>` instead of the current directory
    #[arg(short = 'C', default_value = ".")]
    pub root_path: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum SubCmd {
    Init { path: PathBuf },
    HashObject {
        path: PathBuf,
        #[arg(short = 't', long = "type", default_value = "blob")]
        kind: ObjKind,
        #[arg(short = 'w')]
        write: bool,
    },
    CatFile { mode: String, prefix: String },
    Add { paths: Vec<String> },
    LsFiles {
        #[arg(short = 's')]
        stage: bool,
    },
    Status,
    Diff,
    Commit {
        #[arg(short = 'm')]
        message: String,
        #[arg(short = 'a')]
        author: Option<String>,
    },
    Push {
        url: String,
        #[arg(short = 'u')]
        username: Option<String>,
        #[arg(short = 'p')]
        password: Option<String>,
    },
}

/// parses the `-a` override for `commit`, `"Name <email>"` (same shape
/// the author/committer lines themselves use).
fn parse_author(raw: &str) -> GritResult<Identity> {
    let (name, rest) = raw
        .split_once('<')
        .ok_or_else(|| anyhow!("author `{}` must be of the form `Name <email>`", raw))?;
    let email = rest
        .strip_suffix('>')
        .ok_or_else(|| anyhow!("author `{}` must be of the form `Name <email>`", raw))?;
    Ok(Identity { name: name.trim().to_owned(), email: email.trim().to_owned() })
}

fn print_status_section(header: &str, paths: &[String]) {
    if paths.is_empty() {
        return;
    }
    println!("{}", header);
    for path in paths {
        println!("   {}", path);
    }
}

pub fn run<T: Into<OsString> + Clone>(args: impl IntoIterator<Item = T>) -> GritResult<()> {
    let opts = Opts::parse_from(args);

    if let SubCmd::Init { path } = &opts.subcmd {
        Repository::init(opts.root_path.join(path))?;
        return Ok(());
    }

    let repo = Repository::open(opts.root_path);
    match opts.subcmd {
        SubCmd::Init { .. } => unreachable!(),
        SubCmd::HashObject { path, kind, write } => {
            let payload = std::fs::read(&path)?;
            let oid = repo.hash_object(&payload, kind, write)?;
            println!("{}", oid);
        }
        SubCmd::CatFile { mode, prefix } => {
            std::io::stdout().write_all(&repo.cat(&mode, &prefix)?)?;
        }
        SubCmd::Add { paths } => repo.add(&paths)?,
        SubCmd::LsFiles { stage } => {
            for line in repo.ls_files(stage)? {
                println!("{}", line);
            }
        }
        SubCmd::Status => {
            let status = repo.status()?;
            print_status_section("changed files:", &status.changed);
            print_status_section("new files:", &status.new);
            print_status_section("deleted files:", &status.deleted);
        }
        SubCmd::Diff => print!("{}", repo.diff()?),
        SubCmd::Commit { message, author } => {
            let author = author.map(|raw| parse_author(&raw)).transpose()?;
            let oid = repo.commit(&message, author)?;
            println!("committed to main: {}", oid.short());
        }
        SubCmd::Push { url, username, password } => {
            let username = match username {
                Some(u) => u,
                None => config::push_username()?,
            };
            let password = match password {
                Some(p) => p,
                None => config::push_password()?,
            };
            let report = repo.push(&url, &username, &password)?;
            let from =
                report.remote_tip.map(|oid| oid.to_string()).unwrap_or_else(|| "no commits".to_owned());
            println!(
                "updating remote main from {} to {} ({} object{})",
                from,
                report.local_tip,
                report.object_count,
                if report.object_count == 1 { "" } else { "s" }
            );
        }
    }
    Ok(())
}
