//! Implementação dos comandos CLI do Padrão.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::blocks::BlankLineExtractor;
use crate::hooks::HookSystem;
use crate::learning::{
    format_insights, open_store, CrossProjectLearner, LearnerSettings, SourceFile,
};
use crate::patterns::load_catalog;
use crate::structural::{NoStructuralEngine, StructuralEngine};
use crate::types::config::Config;
use crate::types::language::{language_applies, language_from_path};
use crate::types::{ParserKind, PatternContext};
use crate::{PadraoError, PadraoResult};

/// Arquivos maiores que isso são ignorados pelo `learn`.
const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Initializes configuration in the specified directory.
pub async fn init(path: Option<PathBuf>) -> PadraoResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("padrao.toml");

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        println!("Use 'padrao config' to modify.");
        return Ok(());
    }

    let data_dir = target_dir.join(".padrao");
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!(".padrao/ directory created");
    }

    update_gitignore(&target_dir)?;

    let config = Config::starter();
    config.save(&config_path)?;

    println!("Padrão initialized successfully!");
    println!("Configuration created at: {}", config_path.display());
    println!("Data directory: .padrao/");
    println!();
    println!("Next steps:");
    println!("  1. Review the sample patterns in padrao.toml");
    println!("  2. Learn from a project: padrao learn <dir>");
    println!("  3. Install what was learned: padrao improve");

    Ok(())
}

/// Updates or creates .gitignore to include .padrao/
fn update_gitignore(target_dir: &Path) -> PadraoResult<()> {
    let gitignore_path = target_dir.join(".gitignore");
    let entry = ".padrao/";
    let comment = "# Padrão - learned state";

    if gitignore_path.exists() {
        let content = std::fs::read_to_string(&gitignore_path)?;

        if content.lines().any(|line| line.trim() == entry || line.trim() == ".padrao") {
            tracing::debug!(".gitignore already contains .padrao/");
            return Ok(());
        }

        let mut new_content = content.trim_end().to_string();
        if !new_content.is_empty() {
            new_content.push_str("\n\n");
        }
        new_content.push_str(comment);
        new_content.push('\n');
        new_content.push_str(entry);
        new_content.push('\n');

        std::fs::write(&gitignore_path, new_content)?;
        println!(".gitignore updated with .padrao/");
    } else {
        std::fs::write(&gitignore_path, format!("{}\n{}\n", comment, entry))?;
        println!(".gitignore created with .padrao/");
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// Montagem
// ═══════════════════════════════════════════════════════════════════════════

fn engine() -> Arc<dyn StructuralEngine> {
    Arc::new(NoStructuralEngine)
}

/// Catálogo + store + hooks padrão, conforme a configuração.
fn build_learner(config: &Config) -> PadraoResult<CrossProjectLearner> {
    let hooks = Arc::new(HookSystem::with_defaults());
    let patterns = load_catalog(config, engine(), Some(Arc::clone(&hooks)))?;
    let store = open_store(&config.learning)?;

    Ok(CrossProjectLearner::new(patterns, store)
        .with_settings(LearnerSettings::from(&config.learning))
        .with_hooks(hooks)
        .with_block_extractor(Arc::new(BlankLineExtractor)))
}

fn learning_enabled(config: &Config) -> bool {
    if !config.learning.enabled {
        println!("Aprendizado está desabilitado na configuração.");
    }
    config.learning.enabled
}

/// Lê os arquivos de texto do projeto, respeitando `.gitignore`.
fn collect_files(root: &Path) -> PadraoResult<Vec<SourceFile>> {
    let paths: Vec<PathBuf> = ignore::WalkBuilder::new(root)
        .git_ignore(true)
        .git_exclude(true)
        .require_git(false)
        .max_filesize(Some(MAX_FILE_SIZE))
        .build()
        .filter_map(|entry| match entry {
            Ok(e) if e.file_type().is_some_and(|ft| ft.is_file()) => Some(e.into_path()),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping entry");
                None
            }
        })
        .collect();

    let progress = ProgressBar::new(paths.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        progress.inc(1);
        let relative = path.strip_prefix(root).unwrap_or(&path);
        progress.set_message(relative.display().to_string());

        match std::fs::read_to_string(&path) {
            Ok(content) => files.push(SourceFile::new(relative.display().to_string(), content)),
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable file"),
        }
    }
    progress.finish_and_clear();

    Ok(files)
}

// ═══════════════════════════════════════════════════════════════════════════
// Aprendizado
// ═══════════════════════════════════════════════════════════════════════════

/// Aprende com os arquivos de um diretório.
pub async fn learn(dir: &Path, project_id: Option<String>, config: &Config) -> PadraoResult<()> {
    if !learning_enabled(config) {
        return Ok(());
    }
    if !dir.is_dir() {
        return Err(PadraoError::config(format!(
            "diretório não encontrado: {}",
            dir.display()
        )));
    }

    let project_id = match project_id {
        Some(id) => id,
        None => dir.canonicalize()?.display().to_string(),
    };

    let files = collect_files(dir)?;
    let mut learner = build_learner(config)?;
    let report = learner.learn_from_project(&project_id, &files).await;
    learner.cleanup().await;

    if report.skipped {
        println!("Projeto já aprendido: {}", project_id);
        return Ok(());
    }

    println!("Projeto: {}", project_id);
    println!("Arquivos: {}", report.file_count);
    for (pattern, count) in &report.pattern_counts {
        println!("  {} - {} matches", pattern, count);
    }
    println!("Variações novas: {}", report.new_variations);

    Ok(())
}

/// Instala as melhores variações aprendidas.
pub async fn improve(
    patterns: &[String],
    write: bool,
    config: &Config,
    config_path: &Path,
) -> PadraoResult<()> {
    if !learning_enabled(config) {
        return Ok(());
    }

    let mut learner = build_learner(config)?;
    let names: Vec<&str> = patterns.iter().map(String::as_str).collect();
    let targets = (!names.is_empty()).then_some(names.as_slice());
    let results = learner.apply_improvements(targets).await;

    let mut updated = config.clone();
    let mut written = 0;

    for (name, improved) in &results {
        let Some(pattern) = learner.pattern(name) else {
            continue;
        };
        let rule = pattern.base().text_rule().to_string();
        if *improved {
            println!("  ✓ {}: {}", name, rule);
        } else {
            println!("  - {}: sem melhoria", name);
        }

        if pattern.base().rule().is_structural() {
            // a regra aprendida é só um complemento da consulta estrutural
            continue;
        }
        // inclui melhorias de execuções anteriores, restauradas pelo learner
        if let Some(spec) = updated
            .patterns
            .iter_mut()
            .find(|s| s.name == *name && s.language == pattern.language_id() && s.rule != rule)
        {
            spec.rule = rule;
            written += 1;
        }
    }

    if let Some(missing) = names.iter().find(|n| !results.contains_key(**n)) {
        println!("Padrão não encontrado: {}", missing);
    }

    if write && written > 0 {
        updated.save(config_path)?;
        println!("{} regra(s) gravada(s) em: {}", written, config_path.display());
    }

    learner.cleanup().await;
    Ok(())
}

/// Mostra o estado aprendido.
pub async fn insights(config: &Config) -> PadraoResult<()> {
    let store = open_store(&config.learning)?;
    match store.load().await? {
        Some(snapshot) if !snapshot.is_empty() => println!("{}", format_insights(&snapshot)),
        _ => {
            println!("Nada aprendido ainda.");
            println!("Execute 'padrao learn <dir>' para começar.");
        }
    }
    Ok(())
}

/// Exporta variações aprendidas.
pub async fn export(output: &Path, config: &Config) -> PadraoResult<()> {
    let mut learner = build_learner(config)?;
    let export = learner.export(output).await?;

    let variations: usize = export.pattern_variations.values().map(Vec::len).sum();
    println!("Variações exportadas para: {}", output.display());
    println!("  Padrões: {}", export.pattern_variations.len());
    println!("  Variações: {}", variations);

    Ok(())
}

/// Importa variações de outra instalação.
pub async fn import(input: &Path, config: &Config) -> PadraoResult<()> {
    if !input.exists() {
        println!("Arquivo não encontrado: {}", input.display());
        return Ok(());
    }

    let mut learner = build_learner(config)?;
    let result = learner.import(input).await?;

    println!("Importação concluída:");
    println!("  Variações importadas: {}", result.imported);
    println!("  Variações ignoradas (já existentes): {}", result.skipped);

    Ok(())
}

/// Apaga o estado aprendido.
pub async fn reset(yes: bool, config: &Config) -> PadraoResult<()> {
    if !yes && !super::interactive::confirm("Apagar todo o estado aprendido?")? {
        println!("Cancelado.");
        return Ok(());
    }

    let mut learner = build_learner(config)?;
    learner.reset().await?;
    println!("Estado aprendido apagado ({}).", learner.store().describe());

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// Matching
// ═══════════════════════════════════════════════════════════════════════════

/// Roda o catálogo (ou um padrão) sobre um arquivo e imprime os matches em JSON.
pub async fn match_file(file: &Path, only: Option<&str>, config: &Config) -> PadraoResult<()> {
    let source = std::fs::read_to_string(file)?;
    let location = file.display().to_string();
    let language_id = language_from_path(&location);
    let context = PatternContext::new(&location, language_id, ParserKind::Custom);

    let mut patterns = load_catalog(config, engine(), None)?;
    if let Some(name) = only {
        patterns.retain(|p| p.name() == name);
        if patterns.is_empty() {
            return Err(PadraoError::config(format!("padrão não encontrado: {}", name)));
        }
    }

    let mut report = serde_json::Map::new();
    for pattern in patterns.iter_mut() {
        if !language_applies(pattern.language_id(), language_id) {
            continue;
        }
        let found = pattern.matches(&source, Some(&context)).await;
        report.insert(pattern.name().to_string(), serde_json::to_value(found)?);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Configura opções interativamente.
pub async fn config_cmd(config_path: &Path) -> PadraoResult<()> {
    use super::interactive::{run_interactive_config, show_config_summary};

    if config_path.exists() {
        let config = Config::load(config_path)?;
        show_config_summary(&config);
    }

    run_interactive_config(config_path)
}

/// Diagnostica problemas de configuração.
pub async fn doctor(config: &Config) -> PadraoResult<()> {
    println!("Diagnosticando configuração do Padrão...\n");

    let mut issues: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    println!("✓ Configuração carregada");

    match load_catalog(config, engine(), None) {
        Ok(patterns) if patterns.is_empty() => {
            warnings.push("Catálogo vazio - nenhum padrão configurado".to_string());
        }
        Ok(patterns) => println!("✓ Catálogo válido ({} padrões)", patterns.len()),
        Err(e) => issues.push(format!("Catálogo inválido: {}", e)),
    }

    if config.matching.chunk_overlap >= config.matching.chunk_size {
        warnings.push(format!(
            "chunk_overlap ({}) >= chunk_size ({}) - a sobreposição será reduzida",
            config.matching.chunk_overlap, config.matching.chunk_size
        ));
    }

    if config.learning.enabled {
        match open_store(&config.learning) {
            Ok(store) => match store.load().await {
                Ok(Some(snapshot)) => println!(
                    "✓ Estado aprendido legível ({}, {} projetos)",
                    store.describe(),
                    snapshot.training_projects.len()
                ),
                Ok(None) => println!("✓ Store acessível ({}, vazio)", store.describe()),
                Err(e) => issues.push(format!("Estado aprendido ilegível: {}", e)),
            },
            Err(e) => issues.push(format!("Store indisponível: {}", e)),
        }
    } else {
        println!("○ Aprendizado desabilitado no config");
    }

    println!();
    if issues.is_empty() && warnings.is_empty() {
        println!("✓ Tudo OK! Padrão está pronto para uso.");
    } else {
        if !warnings.is_empty() {
            println!("Avisos:");
            for warning in warnings {
                println!("  ⚠ {}", warning);
            }
        }
        if !issues.is_empty() {
            println!("Problemas:");
            for issue in issues {
                println!("  ✗ {}", issue);
            }
        }
    }

    Ok(())
}

/// Mostra versão.
pub fn version() {
    println!("padrao {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Casamento de padrões adaptativo com aprendizado entre projetos");
    println!("https://github.com/SamoraDC/padrao");
}
