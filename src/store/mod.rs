pub mod ingredient;
pub mod recipe;
pub mod user;

pub use ingredient::IngredientRepository;
pub use recipe::RecipeRepository;
pub use user::UserRepository;
