//! Story Agent CLI
//!
//! Outline, scene and critique commands for long-form fiction.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use story_agent::commands::{
    run_critique, run_init, run_outline, run_scene, CritiqueRequest, OutlineRequest,
    SceneRequest, SceneTarget, DEFAULT_AUDIENCE, DEFAULT_LENGTH,
};
use story_agent::{Config, OutlineDocument, ProviderClient, StoryStore, Telemetry};

#[derive(Parser)]
#[command(name = "story-agent")]
#[command(about = "Story Agent - outline, write and critique fiction with an LLM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file with default provider, model, language and sampling settings
    #[arg(long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    /// Directory holding bible.yaml, outline.yaml and scenes/
    #[arg(long, global = true, default_value = "story")]
    story_dir: PathBuf,

    /// Directory holding the outline/scene/critique prompt templates
    #[arg(long, global = true, default_value = "prompts")]
    prompts_dir: PathBuf,

    /// Provider ("openai" or "ollama") - overrides config file and PROVIDER
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model name - overrides config file and MODEL
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Also write JSON logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the story directories and a starter bible
    Init,

    /// Generate or rewrite the chapter/section outline
    Outline {
        /// Work title
        #[arg(long)]
        title: String,

        /// Genre or style tags
        #[arg(long, num_args = 1..)]
        genres: Vec<String>,

        /// Target audience
        #[arg(long, default_value = DEFAULT_AUDIENCE)]
        audience: String,

        /// Length category (short, novella, novel)
        #[arg(long, default_value = DEFAULT_LENGTH)]
        length: String,

        /// Output language (default from config)
        #[arg(long)]
        language: Option<String>,
    },

    /// Expand one scene of the outline into markdown
    Scene {
        /// Scene index (default: next available)
        #[arg(long)]
        index: Option<u32>,

        /// Chapter name or number
        #[arg(long)]
        chapter: Option<String>,

        /// Section name or number
        #[arg(long)]
        section: Option<String>,

        /// Output language (default from config)
        #[arg(long)]
        language: Option<String>,
    },

    /// Editorial critique of a scene or chapter
    Critique {
        /// Markdown file to review
        #[arg(long)]
        file: PathBuf,

        /// Focus areas, e.g. pacing, characterization, consistency
        #[arg(long, num_args = 1..)]
        focus: Vec<String>,

        /// Output language (default from config)
        #[arg(long)]
        language: Option<String>,
    },
}

impl Cli {
    fn load_config(&self, language: Option<String>) -> Result<Config> {
        let mut config = Config::load(&self.config)?.with_language(language);
        if let Some(provider) = &self.provider {
            config.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let _telemetry = Telemetry::init(cli.log_dir.as_deref(), cli.verbose)?;

    let store = StoryStore::new(&cli.story_dir, &cli.prompts_dir);

    match &cli.command {
        Commands::Init => {
            let report = run_init(&store)?;
            if report.bible_created {
                println!("✓ Created {}", store.bible_path().display());
            }
            println!("✓ Story directory ready: {}", report.story_dir.display());
        }
        Commands::Outline {
            title,
            genres,
            audience,
            length,
            language,
        } => {
            let config = cli.load_config(language.clone())?;
            let client = ProviderClient::new(&config.model, &config.provider)?;
            let request = OutlineRequest {
                title: title.clone(),
                genres: genres.clone(),
                audience: audience.clone(),
                length: length.clone(),
            };
            let report = run_outline(&config, &store, &client, &request).await?;
            match report.outline {
                OutlineDocument::Parsed(_) => {
                    println!("✓ Outline written to {}", report.path.display())
                }
                OutlineDocument::RawFallback(_) => println!(
                    "! Outline was not valid YAML; raw text saved to {}",
                    report.path.display()
                ),
            }
        }
        Commands::Scene {
            index,
            chapter,
            section,
            language,
        } => {
            let config = cli.load_config(language.clone())?;
            let client = ProviderClient::new(&config.model, &config.provider)?;
            let request = SceneRequest {
                index: *index,
                target: SceneTarget {
                    chapter: chapter.clone(),
                    section: section.clone(),
                },
            };
            let path = run_scene(&config, &store, &client, &request).await?;
            println!("✓ Scene written: {}", path.display());
        }
        Commands::Critique {
            file,
            focus,
            language,
        } => {
            let config = cli.load_config(language.clone())?;
            let client = ProviderClient::new(&config.model, &config.provider)?;
            let request = CritiqueRequest {
                file: file.clone(),
                focus: focus.clone(),
            };
            let critique = run_critique(&config, &store, &client, &request).await?;
            println!("{}", critique);
        }
    }

    Ok(())
}
