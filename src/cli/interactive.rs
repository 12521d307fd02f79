//! Configuração interativa do Padrão.
//!
//! Este módulo implementa a configuração interativa usando dialoguer.

use std::path::{Path, PathBuf};

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

use crate::types::config::{Config, StoreKind};
use crate::PadraoResult;

/// Executa a configuração interativa.
pub fn run_interactive_config(config_path: &Path) -> PadraoResult<()> {
    let theme = ColorfulTheme::default();

    println!("\nConfiguração Interativa do Padrão\n");

    let mut config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        println!("Criando nova configuração...\n");
        Config::starter()
    };

    loop {
        let options = [
            "Configurações Gerais",
            "Matching e Recuperação",
            "Adaptação",
            "Aprendizado",
            "Cache",
            "Salvar e Sair",
            "Sair sem Salvar",
        ];

        let selection = Select::with_theme(&theme)
            .with_prompt("O que deseja configurar?")
            .items(&options)
            .default(0)
            .interact()?;

        match selection {
            0 => configure_general(&theme, &mut config)?,
            1 => configure_matching(&theme, &mut config)?,
            2 => configure_adaptation(&theme, &mut config)?,
            3 => configure_learning(&theme, &mut config)?,
            4 => configure_cache(&theme, &mut config)?,
            5 => {
                config.save(config_path)?;
                println!("\n✓ Configuração salva em: {}\n", config_path.display());
                break;
            }
            6 => {
                if Confirm::with_theme(&theme)
                    .with_prompt("Deseja realmente sair sem salvar?")
                    .default(false)
                    .interact()?
                {
                    println!("\nSaindo sem salvar.\n");
                    break;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Pede confirmação antes de uma operação destrutiva.
pub fn confirm(prompt: &str) -> PadraoResult<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

fn configure_general(theme: &ColorfulTheme, config: &mut Config) -> PadraoResult<()> {
    println!("\nConfigurações Gerais\n");

    let log_levels = ["error", "warn", "info", "debug", "trace"];
    let current_idx = log_levels
        .iter()
        .position(|&l| l == config.general.log_level)
        .unwrap_or(2);

    let log_level_idx = Select::with_theme(theme)
        .with_prompt("Nível de log")
        .items(&log_levels)
        .default(current_idx)
        .interact()?;

    config.general.log_level = log_levels[log_level_idx].to_string();

    let log_formats = ["text", "json"];
    let current_format_idx = log_formats
        .iter()
        .position(|&f| f == config.general.log_format)
        .unwrap_or(0);

    let log_format_idx = Select::with_theme(theme)
        .with_prompt("Formato de log")
        .items(&log_formats)
        .default(current_format_idx)
        .interact()?;

    config.general.log_format = log_formats[log_format_idx].to_string();

    println!("\n✓ Configurações gerais atualizadas.\n");
    Ok(())
}

fn configure_matching(theme: &ColorfulTheme, config: &mut Config) -> PadraoResult<()> {
    println!("\nMatching e Recuperação\n");

    let chunk_size: usize = Input::with_theme(theme)
        .with_prompt("Tamanho da janela de recuperação (bytes)")
        .default(config.matching.chunk_size)
        .interact_text()?;

    config.matching.chunk_size = chunk_size.max(1);

    let chunk_overlap: usize = Input::with_theme(theme)
        .with_prompt("Sobreposição entre janelas (bytes)")
        .default(config.matching.chunk_overlap)
        .interact_text()?;

    config.matching.chunk_overlap = chunk_overlap.min(config.matching.chunk_size - 1);

    let max_retries: u32 = Input::with_theme(theme)
        .with_prompt("Tentativas de recuperação")
        .default(config.matching.max_retries)
        .interact_text()?;

    config.matching.max_retries = max_retries;

    let max_matches: usize = Input::with_theme(theme)
        .with_prompt("Máximo de matches por aplicação da regra")
        .default(config.matching.max_matches)
        .interact_text()?;

    config.matching.max_matches = max_matches;

    println!("\n✓ Matching configurado.\n");
    Ok(())
}

fn configure_adaptation(theme: &ColorfulTheme, config: &mut Config) -> PadraoResult<()> {
    println!("\nAdaptação\n");

    config.adaptation.enabled = Confirm::with_theme(theme)
        .with_prompt("Adaptação habilitada?")
        .default(config.adaptation.enabled)
        .interact()?;

    if !config.adaptation.enabled {
        println!("Adaptação desabilitada.\n");
        return Ok(());
    }

    let min_samples: u64 = Input::with_theme(theme)
        .with_prompt("Usos mínimos antes de confiar em um contexto")
        .default(config.adaptation.min_samples)
        .interact_text()?;

    config.adaptation.min_samples = min_samples;

    let threshold: f64 = Input::with_theme(theme)
        .with_prompt("Taxa de sucesso abaixo da qual o padrão se adapta (0-1)")
        .default(config.adaptation.success_threshold)
        .interact_text()?;

    config.adaptation.success_threshold = threshold.clamp(0.0, 1.0);

    println!("\n✓ Adaptação configurada.\n");
    Ok(())
}

fn configure_learning(theme: &ColorfulTheme, config: &mut Config) -> PadraoResult<()> {
    println!("\nAprendizado\n");

    config.learning.enabled = Confirm::with_theme(theme)
        .with_prompt("Aprendizado habilitado?")
        .default(config.learning.enabled)
        .interact()?;

    if !config.learning.enabled {
        println!("Aprendizado desabilitado.\n");
        return Ok(());
    }

    let stores = ["json", "sqlite"];
    let current_idx = match config.learning.store {
        StoreKind::Json => 0,
        StoreKind::Sqlite => 1,
    };

    let store_idx = Select::with_theme(theme)
        .with_prompt("Armazenamento")
        .items(&stores)
        .default(current_idx)
        .interact()?;

    config.learning.store = match store_idx {
        1 => StoreKind::Sqlite,
        _ => StoreKind::Json,
    };

    let insights_path: String = Input::with_theme(theme)
        .with_prompt("Caminho do estado aprendido")
        .default(config.learning.insights_path.display().to_string())
        .interact_text()?;

    config.learning.insights_path = PathBuf::from(insights_path);

    let min_group_size: usize = Input::with_theme(theme)
        .with_prompt("Tamanho mínimo de grupo")
        .default(config.learning.min_group_size)
        .interact_text()?;

    config.learning.min_group_size = min_group_size.max(1);

    config.learning.use_blocks = Confirm::with_theme(theme)
        .with_prompt("Dividir arquivos em blocos antes do match?")
        .default(config.learning.use_blocks)
        .interact()?;

    println!("\n✓ Aprendizado configurado.\n");
    Ok(())
}

fn configure_cache(theme: &ColorfulTheme, config: &mut Config) -> PadraoResult<()> {
    println!("\nConfiguração do Cache\n");

    config.cache.enabled = Confirm::with_theme(theme)
        .with_prompt("Cache habilitado?")
        .default(config.cache.enabled)
        .interact()?;

    if !config.cache.enabled {
        println!("Cache desabilitado.\n");
        return Ok(());
    }

    let capacity: usize = Input::with_theme(theme)
        .with_prompt("Capacidade máxima (número de entradas)")
        .default(config.cache.capacity)
        .interact_text()?;

    config.cache.capacity = capacity;

    let ttl: u64 = Input::with_theme(theme)
        .with_prompt("Tempo de vida (segundos)")
        .default(config.cache.ttl_secs)
        .interact_text()?;

    config.cache.ttl_secs = ttl;

    println!("\n✓ Cache configurado.\n");
    Ok(())
}

/// Mostra resumo da configuração.
pub fn show_config_summary(config: &Config) {
    let yes_no = |flag: bool| if flag { "Sim" } else { "Não" };

    println!("\nResumo da Configuração\n");
    println!("┌─────────────────────────────────────────┐");
    println!("│ Geral                                   │");
    println!("├─────────────────────────────────────────┤");
    println!("│ Log level: {:<28} │", config.general.log_level);
    println!("│ Log format: {:<27} │", config.general.log_format);
    println!("├─────────────────────────────────────────┤");
    println!("│ Matching                                │");
    println!("├─────────────────────────────────────────┤");
    println!("│ Janela: {:<31} │", config.matching.chunk_size);
    println!("│ Sobreposição: {:<25} │", config.matching.chunk_overlap);
    println!("│ Tentativas: {:<27} │", config.matching.max_retries);
    println!("├─────────────────────────────────────────┤");
    println!("│ Adaptação                               │");
    println!("├─────────────────────────────────────────┤");
    println!("│ Habilitada: {:<27} │", yes_no(config.adaptation.enabled));
    println!("│ Usos mínimos: {:<25} │", config.adaptation.min_samples);
    println!("├─────────────────────────────────────────┤");
    println!("│ Aprendizado                             │");
    println!("├─────────────────────────────────────────┤");
    println!("│ Habilitado: {:<27} │", yes_no(config.learning.enabled));
    println!(
        "│ Store: {:<32} │",
        format!("{:?}", config.learning.store).to_lowercase()
    );
    println!("├─────────────────────────────────────────┤");
    println!("│ Cache                                   │");
    println!("├─────────────────────────────────────────┤");
    println!("│ Habilitado: {:<27} │", yes_no(config.cache.enabled));
    if config.cache.enabled {
        println!("│ Capacidade: {:<27} │", config.cache.capacity);
        println!("│ TTL: {:<33}s │", config.cache.ttl_secs);
    }
    println!("├─────────────────────────────────────────┤");
    println!("│ Padrões: {:<30} │", config.patterns.len());
    println!("└─────────────────────────────────────────┘");
    println!();
}
