// Copyright (c) 2025 rezk_nightky

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorScheme {
    Green,
    Amber,
    Gray,
    Cyan,
    Ice,
    Fire,
    Sepia,
    Neon,
}

impl ColorScheme {
    pub const ALL: [(ColorScheme, &'static str, &'static str); 8] = [
        (ColorScheme::Green, "green", "Phosphor green"),
        (ColorScheme::Amber, "amber", "Amber monitor"),
        (ColorScheme::Gray, "gray", "Grayscale (alias: grey)"),
        (ColorScheme::Cyan, "cyan", "Cyan"),
        (ColorScheme::Ice, "ice", "Ice blue to white"),
        (ColorScheme::Fire, "fire", "Ember red to yellow (alias: inferno)"),
        (ColorScheme::Sepia, "sepia", "Old photo brown"),
        (ColorScheme::Neon, "neon", "Magenta to cyan (alias: synthwave)"),
    ];
}

pub fn parse_color_scheme(s: &str) -> Result<ColorScheme, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "green" => Ok(ColorScheme::Green),
        "amber" => Ok(ColorScheme::Amber),
        "gray" | "grey" => Ok(ColorScheme::Gray),
        "cyan" => Ok(ColorScheme::Cyan),
        "ice" => Ok(ColorScheme::Ice),
        "fire" | "inferno" => Ok(ColorScheme::Fire),
        "sepia" => Ok(ColorScheme::Sepia),
        "neon" | "synthwave" => Ok(ColorScheme::Neon),
        _ => Err(format!("invalid color: {} (see --list-colors)", s)),
    }
}

pub fn print_list_colors() {
    println!("AVAILABLE COLOR THEMES:");
    println!("NOTE: Use only the VALUE (left side) with --color.");
    println!();
    println!("VALUE        DESCRIPTION");
    for (_, name, desc) in ColorScheme::ALL {
        println!("{:<12} {}", name, desc);
    }
}
