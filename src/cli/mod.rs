//! Interface de linha de comando do Padrão.

pub mod commands;
pub mod interactive;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Padrão - casamento de padrões adaptativo com aprendizado entre projetos.
#[derive(Parser, Debug)]
#[command(name = "padrao")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Arquivo de configuração.
    #[arg(short, long, default_value = "padrao.toml")]
    pub config: PathBuf,

    /// Modo verbose.
    #[arg(short, long)]
    pub verbose: bool,

    /// Modo silencioso.
    #[arg(short, long)]
    pub quiet: bool,

    /// Comando a executar.
    #[command(subcommand)]
    pub command: Commands,
}

/// Comandos disponíveis.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inicializa configuração no diretório atual.
    Init {
        /// Diretório de destino (padrão: diretório atual).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Aprende com os arquivos de um projeto.
    Learn {
        /// Raiz do projeto.
        dir: PathBuf,

        /// Identificador do projeto (padrão: caminho canônico).
        #[arg(long)]
        project_id: Option<String>,
    },

    /// Instala as melhores variações aprendidas.
    Improve {
        /// Padrões alvo (padrão: todos).
        #[arg(short, long = "pattern")]
        patterns: Vec<String>,

        /// Grava as novas regras no arquivo de configuração.
        #[arg(long)]
        write: bool,
    },

    /// Roda o catálogo sobre um arquivo.
    Match {
        /// Arquivo a analisar.
        file: PathBuf,

        /// Roda apenas este padrão.
        #[arg(short, long)]
        pattern: Option<String>,
    },

    /// Mostra o que foi aprendido.
    Insights,

    /// Exporta variações aprendidas.
    Export {
        /// Arquivo de saída (JSON).
        output: PathBuf,
    },

    /// Importa variações de outra instalação.
    Import {
        /// Arquivo de entrada (JSON).
        input: PathBuf,
    },

    /// Apaga o estado aprendido.
    Reset {
        /// Não pede confirmação.
        #[arg(short, long)]
        yes: bool,
    },

    /// Configura opções interativamente.
    Config,

    /// Diagnostica problemas de configuração.
    Doctor,

    /// Mostra versão.
    Version,
}
