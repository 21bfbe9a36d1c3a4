use itertools::Itertools;

use crate::error::FieldError;

use super::input::RecipeInput;

pub const NAME_MAX_LENGTH: usize = 200;
pub const MIN_COOKING_TIME: i32 = 1;
pub const MIN_AMOUNT: i32 = 1;
pub const DUPLICATE_NAME: &str = "You already have a recipe with this name.";

/// Checks every client-supplied invariant of a recipe document and returns all violations at
/// once. Catalog references and per-author name uniqueness need the store and are checked by
/// the composer.
pub fn validate_recipe(input: &RecipeInput) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let name = input.name.trim();
    if name.is_empty() {
        errors.push(FieldError::new("name", "This field may not be blank."));
    } else if name.chars().count() > NAME_MAX_LENGTH {
        errors.push(FieldError::new(
            "name",
            format!("Ensure this field has no more than {NAME_MAX_LENGTH} characters."),
        ));
    }

    if input.text.trim().is_empty() {
        errors.push(FieldError::new("text", "This field may not be blank."));
    }

    if input.image.trim().is_empty() {
        errors.push(FieldError::new("image", "This field may not be blank."));
    }

    if input.cooking_time < MIN_COOKING_TIME {
        errors.push(FieldError::new(
            "cooking_time",
            format!("Ensure this value is greater than or equal to {MIN_COOKING_TIME}."),
        ));
    }

    if input.ingredients.is_empty() {
        errors.push(FieldError::new("ingredients", "At least one ingredient is required."));
    }

    input
        .ingredients
        .iter()
        .map(|ingredient| ingredient.id)
        .duplicates()
        .for_each(|id| {
            errors.push(FieldError::new(
                "ingredients",
                format!("Ingredient {id} is listed more than once."),
            ));
        });

    input
        .ingredients
        .iter()
        .filter(|ingredient| ingredient.amount < MIN_AMOUNT)
        .for_each(|ingredient| {
            errors.push(FieldError::new(
                "ingredients",
                format!(
                    "Amount of ingredient {} must be at least {MIN_AMOUNT}.",
                    ingredient.id
                ),
            ));
        });

    if input.tags.is_empty() {
        errors.push(FieldError::new("tags", "At least one tag is required."));
    }

    input.tags.iter().duplicates().for_each(|id| {
        errors.push(FieldError::new(
            "tags",
            format!("Tag {id} is listed more than once."),
        ));
    });

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::input::IngredientAmount;

    fn valid_input() -> RecipeInput {
        RecipeInput {
            name: "Pancakes".to_owned(),
            text: "Mix and fry.".to_owned(),
            image: "recipes/images/pancakes.png".to_owned(),
            cooking_time: 20,
            ingredients: vec![
                IngredientAmount { id: 1, amount: 200 },
                IngredientAmount { id: 2, amount: 2 },
            ],
            tags: vec![1],
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn accepts_a_complete_recipe() {
        assert!(validate_recipe(&valid_input()).is_empty());
    }

    #[test]
    fn reports_every_violation() {
        let input = RecipeInput::default();

        let errors = validate_recipe(&input);

        assert_eq!(
            fields(&errors),
            vec!["name", "text", "image", "cooking_time", "ingredients", "tags"]
        );
    }

    #[test]
    fn rejects_duplicate_ingredients() {
        let mut input = valid_input();
        input.ingredients.push(IngredientAmount { id: 1, amount: 50 });

        let errors = validate_recipe(&input);

        assert_eq!(fields(&errors), vec!["ingredients"]);
        assert!(errors[0].message.contains("Ingredient 1"));
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let mut input = valid_input();
        input.ingredients[1].amount = 0;
        input.ingredients[0].amount = -5;

        let errors = validate_recipe(&input);

        assert_eq!(fields(&errors), vec!["ingredients", "ingredients"]);
    }

    #[test]
    fn rejects_duplicate_tags() {
        let mut input = valid_input();
        input.tags = vec![3, 4, 3];

        let errors = validate_recipe(&input);

        assert_eq!(fields(&errors), vec!["tags"]);
    }

    #[test]
    fn rejects_overlong_and_blank_names() {
        let mut input = valid_input();
        input.name = "x".repeat(NAME_MAX_LENGTH + 1);
        assert_eq!(fields(&validate_recipe(&input)), vec!["name"]);

        input.name = "   ".to_owned();
        assert_eq!(fields(&validate_recipe(&input)), vec!["name"]);
    }

    #[test]
    fn cooking_time_must_be_positive() {
        let mut input = valid_input();
        input.cooking_time = 0;
        assert_eq!(fields(&validate_recipe(&input)), vec!["cooking_time"]);
    }
}
