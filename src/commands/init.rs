use std::path::Path;

use anyhow::Context as _;

use crate::{
    InitArgs,
    config::{DEFAULT_CONFIG_FILE, SiteConfig},
};

const INDEX_ORG: &str = "\
#+TITLE: Welcome
#+DATE: <2024-01-01 Mon 12:00>

* Hello

This page lives in =org/index.org=. Every org file below =org/= becomes a page,
and every folder becomes a folder of the site.
";

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{{ page.title }} | {{ site.name }}</title>
</head>
<body>
  <header><a href="{{ site.root }}/index.html">{{ site.name }}</a></header>
  <article>
    <h1>{{ page.title }}</h1>
    {% if page.date %}<time>{{ page.date | datetime }}</time>{% endif %}
    {{ page.html }}
  </article>
  <footer>{{ site.author_name }} ({{ site.author_alias }})</footer>
</body>
</html>
"#;

pub fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            std::fs::create_dir_all(&path)?;
            println!("Created directory {path}", path = path.display());
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    let config_file = path.join(DEFAULT_CONFIG_FILE);
    if config_file.exists() {
        return Err(anyhow::anyhow!(
            "Config file already exists: {config_file}",
            config_file = config_file.display()
        ));
    }

    println!("Initializing site in {}", path.display());
    scaffold(&path)?;

    println!(
        "Created config file {config_file}",
        config_file = config_file.display()
    );

    Ok(())
}

/// Write the config file and the org, templates and media folders.
fn scaffold(path: &Path) -> Result<(), anyhow::Error> {
    let config = SiteConfig::default();

    let org_dir = path.join(&config.org);
    std::fs::create_dir_all(&org_dir)?;
    write_new(&org_dir.join("index.org"), INDEX_ORG)?;

    let templates_dir = path.join(&config.templates);
    std::fs::create_dir_all(&templates_dir)?;
    write_new(&templates_dir.join(&config.default_template), DEFAULT_TEMPLATE)?;

    std::fs::create_dir_all(path.join(&config.media))?;

    let config_text = serde_yaml::to_string(&config)?;
    std::fs::write(path.join(DEFAULT_CONFIG_FILE), config_text)?;

    Ok(())
}

/// Write a scaffold file unless the user already has one there.
fn write_new(path: &Path, content: &str) -> Result<(), anyhow::Error> {
    if path.exists() {
        println!("Keeping existing {}", path.display());
        return Ok(());
    }
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}
