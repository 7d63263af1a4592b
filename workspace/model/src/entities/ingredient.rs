use sea_orm::entity::prelude::*;

/// Catalog entry for an ingredient and the unit it is measured in.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ingredient_recipe::Entity")]
    IngredientRecipe,
}

impl Related<super::ingredient_recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientRecipe.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
