//! Interactive text menu.
//!
//! # Responsibility
//! - Collect field values line by line and call the record service.
//! - Print one `[outcome] message` status line per operation.
//!
//! # Invariants
//! - Input is never parsed beyond what the core exposes; every conversion
//!   failure is reported as a validation error, not a crash.
//! - End of input leaves the menu the same way the exit option does.

use std::io::{self, BufRead, Write};
use std::str::FromStr;
use storedesk_core::{
    parse_count, AddressPatch, EntityKind, NationalId, NewAddress, NewProduct, OperationReport,
    Price, ProductPatch, RecordService, RepoError, User, UserPatch, ValidationError,
};

enum Action {
    Create,
    List,
    Update,
    Delete,
    Back,
}

pub struct Menu<'svc, R, W> {
    service: &'svc mut RecordService,
    input: R,
    output: W,
}

impl<'svc, R: BufRead, W: Write> Menu<'svc, R, W> {
    pub fn new(service: &'svc mut RecordService, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    /// Runs the main menu until the user exits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "storedesk ({} backend)", self.service.backend())?;
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "1) Users")?;
            writeln!(self.output, "2) Products")?;
            writeln!(self.output, "3) Addresses")?;
            writeln!(self.output, "0) Exit")?;
            let Some(choice) = self.prompt("> ")? else {
                return Ok(());
            };
            let entity = match choice.trim() {
                "1" => EntityKind::User,
                "2" => EntityKind::Product,
                "3" => EntityKind::Address,
                "0" => return Ok(()),
                other => {
                    writeln!(self.output, "unknown option `{other}`")?;
                    continue;
                }
            };
            if !self.entity_menu(entity)? {
                return Ok(());
            }
        }
    }

    /// Returns `false` when input ended inside the submenu.
    fn entity_menu(&mut self, entity: EntityKind) -> io::Result<bool> {
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "[{}]", entity.collection())?;
            writeln!(self.output, "1) Create")?;
            writeln!(self.output, "2) List")?;
            writeln!(self.output, "3) Update")?;
            writeln!(self.output, "4) Delete")?;
            writeln!(self.output, "0) Back")?;
            let Some(choice) = self.prompt("> ")? else {
                return Ok(false);
            };
            let action = match choice.trim() {
                "1" => Action::Create,
                "2" => Action::List,
                "3" => Action::Update,
                "4" => Action::Delete,
                "0" => Action::Back,
                other => {
                    writeln!(self.output, "unknown option `{other}`")?;
                    continue;
                }
            };
            let handled = match (entity, action) {
                (_, Action::Back) => return Ok(true),
                (EntityKind::User, Action::Create) => self.create_user()?,
                (EntityKind::User, Action::List) => self.list_users()?,
                (EntityKind::User, Action::Update) => self.update_user()?,
                (EntityKind::Product, Action::Create) => self.create_product()?,
                (EntityKind::Product, Action::List) => self.list_products()?,
                (EntityKind::Product, Action::Update) => self.update_product()?,
                (EntityKind::Address, Action::Create) => self.create_address()?,
                (EntityKind::Address, Action::List) => self.list_addresses()?,
                (EntityKind::Address, Action::Update) => self.update_address()?,
                (entity, Action::Delete) => self.delete(entity)?,
            };
            let Some(report) = handled else {
                return Ok(false);
            };
            writeln!(self.output, "{report}")?;
        }
    }

    fn create_user(&mut self) -> io::Result<Option<OperationReport>> {
        let Some(national_id) = self.prompt("National id: ")? else {
            return Ok(None);
        };
        let Some(name) = self.prompt("Name: ")? else {
            return Ok(None);
        };
        let Some(email) = self.prompt("Email: ")? else {
            return Ok(None);
        };
        let national_id = match NationalId::new(national_id) {
            Ok(value) => value,
            Err(err) => return Ok(Some(rejected(err))),
        };
        let user = User::new(national_id, name.trim(), email.trim());
        let result = self.service.create_user(&user);
        Ok(Some(OperationReport::created(EntityKind::User, &result)))
    }

    fn list_users(&mut self) -> io::Result<Option<OperationReport>> {
        let result = self.service.list_users();
        if let Ok(users) = &result {
            for user in users {
                writeln!(
                    self.output,
                    "{} | {} | {}",
                    user.national_id, user.name, user.email
                )?;
            }
        }
        Ok(Some(OperationReport::listed(EntityKind::User, &result)))
    }

    fn update_user(&mut self) -> io::Result<Option<OperationReport>> {
        let Some(national_id) = self.prompt("National id: ")? else {
            return Ok(None);
        };
        let Some(name) = self.prompt("New name (blank keeps current): ")? else {
            return Ok(None);
        };
        let Some(email) = self.prompt("New email (blank keeps current): ")? else {
            return Ok(None);
        };
        let patch = UserPatch {
            name: non_blank(name),
            email: non_blank(email),
        };
        let result = self.service.update_user(&national_id, &patch);
        Ok(Some(OperationReport::updated(EntityKind::User, &result)))
    }

    fn create_product(&mut self) -> io::Result<Option<OperationReport>> {
        let Some(name) = self.prompt("Name: ")? else {
            return Ok(None);
        };
        let Some(price) = self.prompt("Price: ")? else {
            return Ok(None);
        };
        let Some(quantity) = self.prompt("Quantity: ")? else {
            return Ok(None);
        };
        let price = match Price::from_str(&price) {
            Ok(price) => price,
            Err(err) => return Ok(Some(rejected(err))),
        };
        let quantity = match parse_count("quantity", &quantity) {
            Ok(quantity) => quantity,
            Err(err) => return Ok(Some(rejected(err))),
        };
        let draft = NewProduct::new(name.trim(), price, quantity);
        let result = self.service.create_product(&draft);
        Ok(Some(OperationReport::created(EntityKind::Product, &result)))
    }

    fn list_products(&mut self) -> io::Result<Option<OperationReport>> {
        let result = self.service.list_products();
        if let Ok(products) = &result {
            for product in products {
                writeln!(
                    self.output,
                    "{} | {} | {} | {}",
                    product.id, product.name, product.price, product.quantity
                )?;
            }
        }
        Ok(Some(OperationReport::listed(EntityKind::Product, &result)))
    }

    fn update_product(&mut self) -> io::Result<Option<OperationReport>> {
        let Some(id) = self.prompt("Product id: ")? else {
            return Ok(None);
        };
        let Some(price) = self.prompt("New price: ")? else {
            return Ok(None);
        };
        let patch = match Price::from_str(&price) {
            Ok(price) => ProductPatch { price },
            Err(err) => return Ok(Some(rejected(err))),
        };
        let result = self.service.update_product(&id, &patch);
        Ok(Some(OperationReport::updated(EntityKind::Product, &result)))
    }

    fn create_address(&mut self) -> io::Result<Option<OperationReport>> {
        let Some(street) = self.prompt("Street: ")? else {
            return Ok(None);
        };
        let Some(number) = self.prompt("Number: ")? else {
            return Ok(None);
        };
        let Some(neighborhood) = self.prompt("Neighborhood: ")? else {
            return Ok(None);
        };
        let Some(city) = self.prompt("City: ")? else {
            return Ok(None);
        };
        let Some(postal_code) = self.prompt("Postal code: ")? else {
            return Ok(None);
        };
        let Some(complement) = self.prompt("Complement (optional): ")? else {
            return Ok(None);
        };
        let number = match parse_count("number", &number) {
            Ok(number) => number,
            Err(err) => return Ok(Some(rejected(err))),
        };
        let draft = NewAddress {
            street: street.trim().to_string(),
            number,
            neighborhood: neighborhood.trim().to_string(),
            city: city.trim().to_string(),
            postal_code: postal_code.trim().to_string(),
            complement: complement.trim().to_string(),
        };
        let result = self.service.create_address(&draft);
        Ok(Some(OperationReport::created(EntityKind::Address, &result)))
    }

    fn list_addresses(&mut self) -> io::Result<Option<OperationReport>> {
        let result = self.service.list_addresses();
        if let Ok(addresses) = &result {
            for address in addresses {
                writeln!(
                    self.output,
                    "{} | {}, {} | {} | {} | {} | {}",
                    address.id,
                    address.street,
                    address.number,
                    address.neighborhood,
                    address.city,
                    address.postal_code,
                    address.complement
                )?;
            }
        }
        Ok(Some(OperationReport::listed(EntityKind::Address, &result)))
    }

    fn update_address(&mut self) -> io::Result<Option<OperationReport>> {
        let Some(id) = self.prompt("Address id: ")? else {
            return Ok(None);
        };
        let Some(street) = self.prompt("New street: ")? else {
            return Ok(None);
        };
        let Some(number) = self.prompt("New number: ")? else {
            return Ok(None);
        };
        // Only offered where the backend can store it.
        let complement = if self.service.capabilities().address_complement_update {
            let Some(value) = self.prompt("New complement (blank keeps current): ")? else {
                return Ok(None);
            };
            non_blank(value)
        } else {
            None
        };
        let number = match parse_count("number", &number) {
            Ok(number) => number,
            Err(err) => return Ok(Some(rejected(err))),
        };
        let patch = AddressPatch {
            street: street.trim().to_string(),
            number,
            complement,
        };
        let result = self.service.update_address(&id, &patch);
        Ok(Some(OperationReport::updated(EntityKind::Address, &result)))
    }

    fn delete(&mut self, entity: EntityKind) -> io::Result<Option<OperationReport>> {
        let label = match entity {
            EntityKind::User => "National id: ",
            EntityKind::Product => "Product id: ",
            EntityKind::Address => "Address id: ",
        };
        let Some(key) = self.prompt(label)? else {
            return Ok(None);
        };
        let result = match entity {
            EntityKind::User => self.service.delete_user(&key),
            EntityKind::Product => self.service.delete_product(&key),
            EntityKind::Address => self.service.delete_address(&key),
        };
        Ok(Some(OperationReport::deleted(entity, &result)))
    }

    /// Reads one line without its terminator; `None` at end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn rejected(err: ValidationError) -> OperationReport {
    OperationReport::failed(&RepoError::from(err))
}

#[cfg(test)]
mod tests {
    use super::Menu;
    use std::io::Cursor;
    use storedesk_core::{open_store_in_memory, BackendKind, RecordService};

    fn run_script(backend: BackendKind, script: &str) -> (RecordService, String) {
        let mut service = RecordService::new(open_store_in_memory(backend).unwrap());
        let mut output = Vec::new();
        Menu::new(&mut service, Cursor::new(script.as_bytes()), &mut output)
            .run()
            .unwrap();
        (service, String::from_utf8(output).unwrap())
    }

    #[test]
    fn user_lifecycle_through_the_menu() {
        let script = "1\n1\n111\nAna\na@x.com\n3\n111\n\nb@x.com\n2\n4\n111\n2\n0\n0\n";
        let (service, output) = run_script(BackendKind::Relational, script);

        assert!(output.contains("[success] user created with key 111"));
        assert!(output.contains("[success] user updated"));
        assert!(output.contains("111 | Ana | b@x.com"));
        assert!(output.contains("[success] user deleted"));
        assert!(output.contains("[empty_result] no users found"));
        assert!(service.list_users().unwrap().is_empty());
    }

    #[test]
    fn malformed_price_is_reported_without_touching_the_store() {
        let script = "2\n1\nRice\nabc\n3\n0\n0\n";
        let (service, output) = run_script(BackendKind::Document, script);

        assert!(output.contains("[validation_error]"));
        assert!(service.list_products().unwrap().is_empty());
    }

    #[test]
    fn document_backend_never_asks_for_complement_on_update() {
        let script = "3\n1\nRua A\n10\nCentro\nRecife\n50000000\n\n3\n1\nRua B\n11\n0\n0\n";
        let (service, output) = run_script(BackendKind::Document, script);

        assert!(!output.contains("New complement"));
        assert!(output.contains("[success] address updated"));
        let addresses = service.list_addresses().unwrap();
        assert_eq!(addresses[0].street, "Rua B");
        assert_eq!(addresses[0].number, 11);
    }

    #[test]
    fn relational_backend_updates_complement() {
        let script = "3\n1\nRua A\n10\nCentro\nRecife\n50000000\n\n3\n1\nRua A\n10\nfundos\n0\n0\n";
        let (service, output) = run_script(BackendKind::Relational, script);

        assert!(output.contains("New complement"));
        assert_eq!(service.list_addresses().unwrap()[0].complement, "fundos");
    }

    #[test]
    fn end_of_input_exits_cleanly() {
        let (_service, output) = run_script(BackendKind::Relational, "2\n1\nRice\n");
        assert!(output.contains("Price: "));
        assert!(!output.contains("Quantity: "));
    }

    #[test]
    fn unknown_options_are_reported() {
        let (_service, output) = run_script(BackendKind::Relational, "9\n0\n");
        assert!(output.contains("unknown option `9`"));
    }
}
