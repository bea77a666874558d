//! Equipment registry service

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::OperationalState,
        equipment::{
            CreateEquipment, Equipment, EquipmentQuery, EquipmentWithLoan, UpdateEquipment,
        },
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
}

impl EquipmentService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &EquipmentQuery) -> AppResult<Vec<Equipment>> {
        self.repository.equipment.list(query).await
    }

    pub async fn list_available(&self) -> AppResult<Vec<Equipment>> {
        self.repository.equipment.list_available().await
    }

    /// Equipment detail with its loan context for the counter views
    pub async fn get_with_loan(&self, id: i32) -> AppResult<EquipmentWithLoan> {
        let equipment = self.repository.equipment.get_by_id(id).await?;
        let active_loan = self.repository.loans.get_active_for(id).await?;
        let last_returned_loan = self.repository.loans.last_returned_for(id).await?;
        Ok(EquipmentWithLoan {
            equipment,
            active_loan,
            last_returned_loan,
        })
    }

    pub async fn create(&self, mut data: CreateEquipment) -> AppResult<Equipment> {
        data.serial = data.serial.trim().to_uppercase();
        data.brand = data.brand.trim().to_string();
        data.model = data.model.trim().to_string();
        data.category = data.category.trim().to_uppercase();
        if let Some(os) = data.os.take() {
            let os = os.trim().to_string();
            data.os = (!os.is_empty()).then_some(os);
        }

        if data.serial.is_empty() || data.brand.is_empty() || data.model.is_empty() {
            return Err(AppError::Validation(
                "Serial, brand and model are required".to_string(),
            ));
        }
        if data.category.is_empty() {
            return Err(AppError::Validation("Category is required".to_string()));
        }

        self.repository.equipment.create(&data).await
    }

    pub async fn update(&self, id: i32, mut data: UpdateEquipment) -> AppResult<Equipment> {
        if let Some(category) = data.category.take() {
            let category = category.trim().to_uppercase();
            if category.is_empty() {
                return Err(AppError::Validation("Category cannot be blank".to_string()));
            }
            data.category = Some(category);
        }
        self.repository.equipment.update(id, &data).await
    }

    /// Change operational state. Retiring equipment that is still out in the
    /// field is refused; it has to come back first.
    pub async fn set_state(&self, id: i32, state: OperationalState) -> AppResult<Equipment> {
        let equipment = self.repository.equipment.get_by_id(id).await?;
        if state == OperationalState::Retired {
            if let Some(loan) = self.repository.loans.get_active_for(id).await? {
                return Err(AppError::Conflict(format!(
                    "Cannot retire equipment {}: loan {} is still active",
                    equipment.serial, loan.id
                )));
            }
        }
        self.repository.equipment.set_state(id, state).await
    }

    /// Delete equipment. Anything with loan history can only be retired,
    /// never deleted.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let equipment = self.repository.equipment.get_by_id(id).await?;
        if self.repository.loans.any_for_equipment(id).await? {
            return Err(AppError::Conflict(format!(
                "Equipment {} has loan history and can only be retired",
                equipment.serial
            )));
        }
        self.repository.equipment.delete(id).await
    }

    pub async fn categories(&self) -> AppResult<Vec<String>> {
        self.repository.equipment.categories().await
    }
}
