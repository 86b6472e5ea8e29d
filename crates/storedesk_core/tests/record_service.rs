use std::str::FromStr;

use storedesk_core::{
    open_store_in_memory, AddressPatch, BackendKind, EntityKind, NationalId, NewAddress,
    NewProduct, OperationReport, Outcome, Price, ProductPatch, RecordService, RepoError,
    UpdateOutcome, User, UserPatch,
};

const BACKENDS: [BackendKind; 2] = [BackendKind::Relational, BackendKind::Document];

fn service(backend: BackendKind) -> RecordService {
    RecordService::new(open_store_in_memory(backend).unwrap())
}

fn ana() -> User {
    User::new(NationalId::new("111").unwrap(), "Ana", "a@x.com")
}

fn rice() -> NewProduct {
    NewProduct::new("Rice", Price::from_str("12.50").unwrap(), 10)
}

fn main_street() -> NewAddress {
    NewAddress {
        street: "Rua A".to_string(),
        number: 42,
        neighborhood: "Centro".to_string(),
        city: "Recife".to_string(),
        postal_code: "50000000".to_string(),
        complement: "apto 1".to_string(),
    }
}

#[test]
fn user_lifecycle_scenario() {
    for backend in BACKENDS {
        let mut service = service(backend);

        let key = service.create_user(&ana()).unwrap();
        assert_eq!(key.as_str(), "111");

        let users = service.list_users().unwrap();
        assert_eq!(users, vec![ana()], "backend {backend}");

        let patch = UserPatch {
            name: None,
            email: Some("b@x.com".to_string()),
        };
        assert_eq!(
            service.update_user("111", &patch).unwrap(),
            UpdateOutcome::Updated
        );
        let users = service.list_users().unwrap();
        assert_eq!(users[0].name, "Ana");
        assert_eq!(users[0].email, "b@x.com");

        service.delete_user("111").unwrap();
        assert!(service
            .list_users()
            .unwrap()
            .iter()
            .all(|user| user.national_id.as_str() != "111"));
    }
}

#[test]
fn duplicate_national_id_is_reported_and_original_kept() {
    for backend in BACKENDS {
        let mut service = service(backend);
        service.create_user(&ana()).unwrap();

        let clash = User::new(NationalId::new("111").unwrap(), "Other", "o@x.com");
        let err = service.create_user(&clash).unwrap_err();
        assert!(
            matches!(err, RepoError::DuplicateKey { entity: EntityKind::User, .. }),
            "backend {backend}: {err}"
        );
        assert_eq!(service.list_users().unwrap(), vec![ana()]);
    }
}

#[test]
fn invalid_user_never_reaches_the_store() {
    for backend in BACKENDS {
        let mut service = service(backend);
        let blank_name = User::new(NationalId::new("222").unwrap(), " ", "c@x.com");

        let err = service.create_user(&blank_name).unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
        assert!(service.list_users().unwrap().is_empty());
    }
}

#[test]
fn update_distinguishes_updated_no_change_and_not_found() {
    for backend in BACKENDS {
        let mut service = service(backend);
        service.create_user(&ana()).unwrap();

        let same = UserPatch {
            name: Some("Ana".to_string()),
            email: None,
        };
        assert_eq!(
            service.update_user("111", &same).unwrap(),
            UpdateOutcome::NoChange
        );
        assert_eq!(
            service.update_user("111", &UserPatch::default()).unwrap(),
            UpdateOutcome::NoChange
        );

        let err = service.update_user("999", &same).unwrap_err();
        assert!(matches!(err, RepoError::NotFound { .. }));

        let product_id = service.create_product(&rice()).unwrap().to_string();
        let same_price = ProductPatch {
            price: Price::from_str("12.5").unwrap(),
        };
        assert_eq!(
            service.update_product(&product_id, &same_price).unwrap(),
            UpdateOutcome::NoChange,
            "backend {backend}"
        );
        let new_price = ProductPatch {
            price: Price::from_cents(1399),
        };
        assert_eq!(
            service.update_product(&product_id, &new_price).unwrap(),
            UpdateOutcome::Updated
        );
        assert!(matches!(
            service.update_product("12345", &new_price).unwrap_err(),
            RepoError::NotFound { .. }
        ));
    }
}

#[test]
fn delete_twice_reports_not_found_the_second_time() {
    for backend in BACKENDS {
        let mut service = service(backend);
        let id = service.create_address(&main_street()).unwrap().to_string();

        let first = service.delete_address(&id);
        let second = service.delete_address(&id);

        assert_eq!(
            OperationReport::deleted(EntityKind::Address, &first).outcome,
            Outcome::Success
        );
        assert_eq!(
            OperationReport::deleted(EntityKind::Address, &second).outcome,
            Outcome::NotFound
        );
    }
}

#[test]
fn product_create_list_round_trip_keeps_two_decimal_price() {
    for backend in BACKENDS {
        let mut service = service(backend);
        let id = service.create_product(&rice()).unwrap();

        let products = service.list_products().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, id);
        assert_eq!(products[0].name, "Rice");
        assert_eq!(products[0].price.to_string(), "12.50");
        assert_eq!(products[0].quantity, 10);
    }
}

#[test]
fn second_product_key_follows_the_first() {
    for backend in BACKENDS {
        let mut service = service(backend);
        let first = service.create_product(&rice()).unwrap();
        let second = service.create_product(&rice()).unwrap();
        assert_eq!(second, first + 1, "backend {backend}");
    }
}

#[test]
fn address_create_list_round_trip() {
    for backend in BACKENDS {
        let mut service = service(backend);
        let id = service.create_address(&main_street()).unwrap();

        let addresses = service.list_addresses().unwrap();
        assert_eq!(addresses, vec![main_street().into_address(id)]);
    }
}

#[test]
fn address_street_and_number_update_on_both_backends() {
    for backend in BACKENDS {
        let mut service = service(backend);
        let id = service.create_address(&main_street()).unwrap();

        let patch = AddressPatch {
            street: "Rua B".to_string(),
            number: 7,
            complement: None,
        };
        assert_eq!(
            service.update_address(&id.to_string(), &patch).unwrap(),
            UpdateOutcome::Updated
        );
        assert_eq!(
            service.update_address(&id.to_string(), &patch).unwrap(),
            UpdateOutcome::NoChange
        );

        let stored = &service.list_addresses().unwrap()[0];
        assert_eq!(stored.street, "Rua B");
        assert_eq!(stored.number, 7);
        assert_eq!(stored.complement, "apto 1");
    }
}

#[test]
fn complement_update_follows_backend_capability() {
    for backend in BACKENDS {
        let mut service = service(backend);
        let id = service.create_address(&main_street()).unwrap().to_string();
        let patch = AddressPatch {
            street: "Rua A".to_string(),
            number: 42,
            complement: Some("casa".to_string()),
        };

        let result = service.update_address(&id, &patch);
        if service.capabilities().address_complement_update {
            assert_eq!(result.unwrap(), UpdateOutcome::Updated);
            assert_eq!(service.list_addresses().unwrap()[0].complement, "casa");
        } else {
            assert!(matches!(result.unwrap_err(), RepoError::Validation(_)));
            assert_eq!(service.list_addresses().unwrap()[0].complement, "apto 1");
        }
    }
}

#[test]
fn malformed_keys_are_validation_errors() {
    for backend in BACKENDS {
        let mut service = service(backend);
        service.create_product(&rice()).unwrap();

        for key in ["abc", "", "-1", "0", "1.5"] {
            let err = service.delete_product(key).unwrap_err();
            assert!(matches!(err, RepoError::Validation(_)), "key `{key}`");
        }
        assert!(matches!(
            service.delete_user("   ").unwrap_err(),
            RepoError::Validation(_)
        ));
        assert_eq!(service.list_products().unwrap().len(), 1);
    }
}

#[test]
fn empty_listing_reports_empty_result() {
    for backend in BACKENDS {
        let service = service(backend);
        let report = OperationReport::listed(EntityKind::Product, &service.list_products());
        assert_eq!(report.outcome, Outcome::EmptyResult);
    }
}

#[test]
fn capabilities_reflect_key_allocation_strategy() {
    assert!(service(BackendKind::Relational).capabilities().native_auto_increment);
    assert!(!service(BackendKind::Document).capabilities().native_auto_increment);
    assert_eq!(service(BackendKind::Document).backend(), BackendKind::Document);
}
