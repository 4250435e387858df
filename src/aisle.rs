//! Aisle configuration parser
//!
//! This module is only available with the `aisle` [feature](crate::_features).
//!
//! ```text
//! [produce]
//! tomato|tomatoes
//! basil
//!
//! [dairy]
//! milk // comments are allowed
//! ```
//!
//! Lines after a `[category]` are ingredients, with aliases separated by
//! `|`. The first name is the common name.
use std::collections::HashMap;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::normalize;

/// Represents a aisle configuration file
///
/// This type also implements [`Serialize`] and [`Deserialize`], so if you don't
/// like the line format you can swap it with any [`serde`] format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AisleConf {
    /// List of categories
    pub categories: Vec<Category>,
    // normalized name -> (category, ingredient)
    #[serde(skip)]
    index: OnceCell<HashMap<String, (usize, usize)>>,
}

impl PartialEq for AisleConf {
    fn eq(&self, other: &Self) -> bool {
        self.categories == other.categories
    }
}

/// A category, or aisle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Name of the category
    pub name: String,
    /// List of ingredients belonging to this category
    pub ingredients: Vec<Ingredient>,
}

/// An ingredient belonging to a [`Category`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// List of names of the ingredient
    pub names: Vec<String>,
}

impl AisleConf {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories,
            index: OnceCell::new(),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn index(&self) -> &HashMap<String, (usize, usize)> {
        self.index.get_or_init(|| {
            let mut map = HashMap::new();
            for (c, cat) in self.categories.iter().enumerate() {
                for (i, igr) in cat.ingredients.iter().enumerate() {
                    for name in &igr.names {
                        map.entry(normalize(name)).or_insert((c, i));
                    }
                }
            }
            map
        })
    }

    /// Category of an ingredient
    ///
    /// The name is compared normalized with every name and alias.
    pub fn category_of(&self, name: &str) -> Option<&str> {
        let &(c, _) = self.index().get(&normalize(name))?;
        Some(self.categories[c].name.as_str())
    }

    /// Common name of an ingredient, the first in its line
    pub fn common_name(&self, name: &str) -> Option<&str> {
        let &(c, i) = self.index().get(&normalize(name))?;
        self.categories[c].ingredients[i]
            .names
            .first()
            .map(String::as_str)
    }
}

/// Parse an [`AisleConf`]
pub fn parse(input: &str) -> Result<AisleConf, AisleConfError> {
    let mut categories: Vec<Category> = Vec::new();
    let mut current_category: Option<Category> = None;

    let mut used_categories: HashMap<&str, usize> = HashMap::new();
    let mut used_names: HashMap<String, usize> = HashMap::new();

    for (n, mut line) in input.lines().enumerate() {
        let line_no = n + 1;
        // strip comment
        if let Some((l, _)) = line.split_once("//") {
            line = l;
        }
        line = line.trim();

        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim();
            if name.is_empty() || name.contains('|') {
                return Err(AisleConfError::Parse {
                    line: line_no,
                    message: "Invalid category name".to_string(),
                });
            }

            if let Some(&first_line) = used_categories.get(name) {
                return Err(AisleConfError::DuplicateCategory {
                    name: name.to_string(),
                    first_line,
                    second_line: line_no,
                });
            }
            used_categories.insert(name, line_no);

            let new_cat = Category {
                name: name.to_string(),
                ingredients: Vec::new(),
            };
            if let Some(cat) = current_category.replace(new_cat) {
                categories.push(cat);
            }
        } else if !line.is_empty() {
            let Some(cat) = &mut current_category else {
                return Err(AisleConfError::Parse {
                    line: line_no,
                    message: "Expected category".to_string(),
                });
            };

            let mut names = Vec::new();
            for name in line.split('|').map(str::trim).filter(|n| !n.is_empty()) {
                let key = normalize(name);
                if let Some(&first_line) = used_names.get(&key) {
                    return Err(AisleConfError::DuplicateIngredient {
                        name: name.to_string(),
                        first_line,
                        second_line: line_no,
                    });
                }
                used_names.insert(key, line_no);
                names.push(name.to_string());
            }
            if !names.is_empty() {
                cat.ingredients.push(Ingredient { names });
            }
        }
    }

    if let Some(cat) = current_category {
        categories.push(cat);
    }

    Ok(AisleConf::new(categories))
}

/// Write an [`AisleConf`] in the line format
pub fn write(conf: &AisleConf, mut write: impl std::io::Write) -> std::io::Result<()> {
    let w = &mut write;
    for category in &conf.categories {
        writeln!(w, "[{}]", category.name)?;
        for ingredient in &category.ingredients {
            if !ingredient.names.is_empty() {
                writeln!(w, "{}", ingredient.names.join("|"))?;
            }
        }
        writeln!(w)?;
    }

    Ok(())
}

/// Error generated by [`parse`].
///
/// Lines start at 1.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AisleConfError {
    #[error("Error parsing input at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Duplicate category '{name}' at line {second_line}, first defined at line {first_line}")]
    DuplicateCategory {
        /// Duplicated category name
        name: String,
        first_line: usize,
        second_line: usize,
    },
    #[error("Duplicate ingredient '{name}' at line {second_line}, first defined at line {first_line}")]
    DuplicateIngredient {
        /// Duplicated ingredient name
        name: String,
        first_line: usize,
        second_line: usize,
    },
}
