use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::errors::ApiError;
use crate::models::ingredient::{IngredientModel, IngredientPayload, validate_name};

/// Largest price that fits five digits with two decimal places.
pub const MAX_PRICE_CENTS: i64 = 99_999;

/// A non-negative amount with two decimal places, stored as whole cents and
/// serialized as a string such as `"4.50"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PriceInput", into = "String")]
pub struct Price(i64);

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceInput {
    Text(String),
    Number(f64),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("A valid number is required")]
    Invalid,
    #[error("Ensure that there are no more than 2 decimal places")]
    TooPrecise,
    #[error("Ensure that there are no more than 5 digits in total")]
    TooLarge,
    #[error("Ensure this value is greater than or equal to 0")]
    Negative,
}

impl Price {
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        if cents < 0 {
            Err(PriceError::Negative)
        } else if cents > MAX_PRICE_CENTS {
            Err(PriceError::TooLarge)
        } else {
            Ok(Self(cents))
        }
    }

    pub fn cents(self) -> i64 {
        self.0
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(PriceError::Negative);
        }
        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(PriceError::Invalid);
        }
        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > 2 {
            return Err(PriceError::TooPrecise);
        }
        let whole = whole.trim_start_matches('0');
        if whole.len() > 3 {
            return Err(PriceError::TooLarge);
        }
        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| PriceError::Invalid)? };
        let fraction: i64 = format!("{fraction:0<2}").parse().map_err(|_| PriceError::Invalid)?;
        Self::from_cents(whole * 100 + fraction)
    }
}

impl TryFrom<PriceInput> for Price {
    type Error = PriceError;

    fn try_from(input: PriceInput) -> Result<Self, Self::Error> {
        match input {
            PriceInput::Text(text) => text.parse(),
            PriceInput::Number(n) if n.is_finite() => n.to_string().parse(),
            PriceInput::Number(_) => Err(PriceError::Invalid),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        price.to_string()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub time_minutes: i64,
    pub price_cents: i64,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Price,
    pub link: String,
    pub ingredients: Vec<IngredientModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub summary: RecipeSummary,
    pub description: String,
}

impl RecipeRow {
    pub fn into_summary(self, ingredients: Vec<IngredientModel>) -> anyhow::Result<RecipeSummary> {
        Ok(RecipeSummary {
            id: self.id,
            title: self.title,
            time_minutes: self.time_minutes,
            price: Price::from_cents(self.price_cents)?,
            link: self.link,
            ingredients,
        })
    }

    pub fn into_detail(mut self, ingredients: Vec<IngredientModel>) -> anyhow::Result<RecipeDetail> {
        let description = std::mem::take(&mut self.description);
        Ok(RecipeDetail {
            summary: self.into_summary(ingredients)?,
            description,
        })
    }

    fn fields(&self) -> anyhow::Result<RecipeFields> {
        Ok(RecipeFields {
            title: self.title.clone(),
            description: self.description.clone(),
            time_minutes: self.time_minutes,
            price: Price::from_cents(self.price_cents)?,
            link: self.link.clone(),
        })
    }
}

/// Validated scalar columns of a recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeFields {
    pub title: String,
    pub description: String,
    pub time_minutes: i64,
    pub price: Price,
    pub link: String,
}

/// Body of `POST /recipes/` and `PUT /recipes/{id}`.
#[derive(Debug, Deserialize)]
pub struct RecipePayload {
    pub title: String,
    pub time_minutes: i64,
    pub price: Price,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<IngredientPayload>,
}

/// Body of `PATCH /recipes/{id}`. `ingredients`, when present, replaces the links.
#[derive(Debug, Default, Deserialize)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<Vec<IngredientPayload>>,
}

fn validate_time(time_minutes: i64) -> Result<i64, ApiError> {
    if time_minutes < 0 {
        return Err(ApiError::validation("time_minutes must be greater than or equal to 0"));
    }
    Ok(time_minutes)
}

/// Validate nested ingredient names, dropping repeats while keeping first-seen order.
fn validate_ingredient_names(ingredients: Vec<IngredientPayload>) -> Result<Vec<String>, ApiError> {
    let mut names: Vec<String> = Vec::with_capacity(ingredients.len());
    for ingredient in ingredients {
        let name = validate_name("ingredient name", &ingredient.name)?;
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

impl RecipePayload {
    pub fn validate(self) -> Result<(RecipeFields, Vec<String>), ApiError> {
        let fields = RecipeFields {
            title: validate_name("title", &self.title)?,
            description: self.description,
            time_minutes: validate_time(self.time_minutes)?,
            price: self.price,
            link: self.link.trim().to_string(),
        };
        Ok((fields, validate_ingredient_names(self.ingredients)?))
    }
}

impl RecipePatch {
    /// Merge the patch over the stored row. Returns the new columns and, when
    /// the patch names ingredients, the replacement ingredient names.
    pub fn apply(
        self,
        current: &RecipeRow,
    ) -> Result<(RecipeFields, Option<Vec<String>>), ApiError> {
        let mut fields = current.fields()?;
        if let Some(title) = self.title {
            fields.title = validate_name("title", &title)?;
        }
        if let Some(time_minutes) = self.time_minutes {
            fields.time_minutes = validate_time(time_minutes)?;
        }
        if let Some(price) = self.price {
            fields.price = price;
        }
        if let Some(link) = self.link {
            fields.link = link.trim().to_string();
        }
        if let Some(description) = self.description {
            fields.description = description;
        }
        let ingredients = self.ingredients.map(validate_ingredient_names).transpose()?;
        Ok((fields, ingredients))
    }
}

/// Query string of `GET /recipes/`: `ingredients` is a comma separated id list.
/// A blank list means no filter.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeFilter {
    pub ingredients: Option<String>,
}

impl RecipeFilter {
    pub fn ingredient_ids(&self) -> Result<Option<Vec<i64>>, ApiError> {
        let Some(raw) = self.ingredients.as_deref() else {
            return Ok(None);
        };
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i64>().map_err(|_| {
                    ApiError::validation(format!("'{part}' is not a valid ingredient id"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|ids| (!ids.is_empty()).then_some(ids))
    }
}
