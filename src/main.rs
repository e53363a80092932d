use std::io::Read;

use clap::{Parser, Subcommand};

use hunkview::{DiffDocument, DiffView, DiffViewConfig, WordDiffMode, position};

#[derive(Parser)]
#[command(name = "hunkview")]
#[command(about = "Render git diffs and map cursor positions back to file locations")]
struct Cli {
    /// Repository path
    #[arg(short = 'C', long = "repo", default_value = ".")]
    repo: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the diff of the working tree or the index
    Diff {
        /// Diff the index instead of the working tree
        #[arg(long)]
        cached: bool,
        /// Pass --ignore-all-space to git
        #[arg(long)]
        ignore_whitespace: bool,
        /// Context lines around each hunk
        #[arg(long, default_value_t = 3)]
        context: u32,
        /// Render an inline word diff
        #[arg(long)]
        word_diff: bool,
        /// Limit the diff to one file
        file: Option<String>,
    },
    /// Read diff text from stdin and resolve a byte offset to file:row:col
    Locate {
        /// Byte offset of the cursor in the diff text
        offset: usize,
    },
    /// Show one commit with stats and patch
    Show {
        /// Commit hash or ref
        commit: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Diff {
            cached,
            ignore_whitespace,
            context,
            word_diff,
            file,
        } => {
            let config = DiffViewConfig {
                file_path: file,
                in_cached_mode: cached,
                ignore_whitespace,
                context_lines: context,
                word_diff: if word_diff {
                    WordDiffMode::Word
                } else {
                    WordDiffMode::Off
                },
                ..Default::default()
            };
            let mut view = DiffView::new(cli.repo, config);
            print!("{}", view.refresh()?.text);
        }
        Commands::Locate { offset } => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;

            let doc = DiffDocument::parse(&text);
            if let Some(jump) = hunkview::map_cursor_to_file_location(&doc, offset, None) {
                println!("{}:{}:{}", jump.filename, jump.row, jump.col);
            } else {
                let line = doc.slice(position::line_bounds(&text, offset));
                match hunkview::file_reference(line) {
                    Some(filename) => println!("{filename}"),
                    None => println!("Not within a hunk"),
                }
            }
        }
        Commands::Show { commit } => {
            let view = DiffView::new(cli.repo, DiffViewConfig::default());
            print!("{}", view.show_commit(&commit)?);
        }
    }

    Ok(())
}
