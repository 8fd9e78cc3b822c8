use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scancart_catalog::Product;
use scancart_core::{Aggregate, AggregateRoot, CartId, DomainError, Entity, Money, ProductId};
use scancart_events::Event;

use crate::line_item::{LineItem, clamp_quantity};

/// Aggregate root: Cart.
///
/// Lines are ordered most-recently-touched first. No two lines share a
/// product id, and no two share a barcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    id: CartId,
    lines: Vec<LineItem>,
    version: u64,
}

impl Cart {
    pub fn new(id: CartId) -> Self {
        Self {
            id,
            lines: Vec::new(),
            version: 0,
        }
    }

    pub fn id_typed(&self) -> CartId {
        self.id
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, line_id: &ProductId) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.id() == line_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of line subtotals, derived on every call.
    pub fn total(&self) -> Money {
        self.lines.iter().map(LineItem::subtotal).sum()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.iter().map(LineSnapshot::from).collect(),
            total: self.total(),
        }
    }

    /// Merge the first product of a resolved lookup into the cart.
    ///
    /// An empty result is `DomainError::NotFound` and leaves the cart as is.
    pub fn apply_resolution(
        &mut self,
        products: &[Product],
    ) -> Result<Vec<CartEvent>, DomainError> {
        self.execute(CartCommand::AddResolved(AddResolved {
            cart_id: self.id,
            products: products.to_vec(),
            occurred_at: Utc::now(),
        }))
    }

    /// Set a line's quantity, clamping non-positive requests to 1.
    ///
    /// Does not reorder lines. Unknown line ids are a no-op.
    pub fn set_quantity(
        &mut self,
        line_id: ProductId,
        requested: i64,
    ) -> Result<Vec<CartEvent>, DomainError> {
        self.execute(CartCommand::SetQuantity(SetQuantity {
            cart_id: self.id,
            line_id,
            requested,
            occurred_at: Utc::now(),
        }))
    }

    /// Remove a line. Unknown line ids are a no-op.
    pub fn remove_line_item(&mut self, line_id: ProductId) -> Result<Vec<CartEvent>, DomainError> {
        self.execute(CartCommand::RemoveLine(RemoveLine {
            cart_id: self.id,
            line_id,
            occurred_at: Utc::now(),
        }))
    }

    pub fn clear(&mut self) -> Result<Vec<CartEvent>, DomainError> {
        self.execute(CartCommand::ClearCart(ClearCart {
            cart_id: self.id,
            occurred_at: Utc::now(),
        }))
    }

    fn execute(&mut self, command: CartCommand) -> Result<Vec<CartEvent>, DomainError> {
        let events = self.handle(&command)?;
        for event in &events {
            self.apply(event);
        }
        Ok(events)
    }

    fn position(&self, line_id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|l| l.id() == line_id)
    }
}

impl AggregateRoot for Cart {
    type Id = CartId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Line as seen by observers, with its derived subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub barcode: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

impl From<&LineItem> for LineSnapshot {
    fn from(line: &LineItem) -> Self {
        Self {
            product_id: *line.id(),
            name: line.product().name.clone(),
            barcode: line.product().barcode.clone(),
            unit_price: line.unit_price(),
            quantity: line.quantity(),
            subtotal: line.subtotal(),
        }
    }
}

/// Cart as seen by observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub lines: Vec<LineSnapshot>,
    pub total: Money,
}

/// Command: AddResolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddResolved {
    pub cart_id: CartId,
    /// Lookup result in catalog ranking order; only the first is merged.
    pub products: Vec<Product>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetQuantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetQuantity {
    pub cart_id: CartId,
    pub line_id: ProductId,
    pub requested: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveLine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLine {
    pub cart_id: CartId,
    pub line_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ClearCart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearCart {
    pub cart_id: CartId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartCommand {
    AddResolved(AddResolved),
    SetQuantity(SetQuantity),
    RemoveLine(RemoveLine),
    ClearCart(ClearCart),
}

/// Event: LineAdded (new line at the front, quantity 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAdded {
    pub cart_id: CartId,
    pub product: Product,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineIncremented (existing line moved to the front).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineIncremented {
    pub cart_id: CartId,
    pub line_id: ProductId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuantitySet (manual edit, position unchanged).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantitySet {
    pub cart_id: CartId,
    pub line_id: ProductId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRemoved {
    pub cart_id: CartId,
    pub line_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CartCleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCleared {
    pub cart_id: CartId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartEvent {
    LineAdded(LineAdded),
    LineIncremented(LineIncremented),
    QuantitySet(QuantitySet),
    LineRemoved(LineRemoved),
    CartCleared(CartCleared),
}

impl Event for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::LineAdded(_) => "cart.line.added",
            CartEvent::LineIncremented(_) => "cart.line.incremented",
            CartEvent::QuantitySet(_) => "cart.line.quantity_set",
            CartEvent::LineRemoved(_) => "cart.line.removed",
            CartEvent::CartCleared(_) => "cart.cleared",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CartEvent::LineAdded(e) => e.occurred_at,
            CartEvent::LineIncremented(e) => e.occurred_at,
            CartEvent::QuantitySet(e) => e.occurred_at,
            CartEvent::LineRemoved(e) => e.occurred_at,
            CartEvent::CartCleared(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Cart {
    type Command = CartCommand;
    type Event = CartEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CartEvent::LineAdded(e) => {
                self.lines.insert(0, LineItem::new(e.product.clone()));
            }
            CartEvent::LineIncremented(e) => {
                if let Some(index) = self.position(&e.line_id) {
                    let mut line = self.lines.remove(index);
                    line.set_quantity(e.quantity);
                    self.lines.insert(0, line);
                }
            }
            CartEvent::QuantitySet(e) => {
                if let Some(index) = self.position(&e.line_id) {
                    self.lines[index].set_quantity(e.quantity);
                }
            }
            CartEvent::LineRemoved(e) => {
                self.lines.retain(|l| l.id() != &e.line_id);
            }
            CartEvent::CartCleared(_) => {
                self.lines.clear();
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CartCommand::AddResolved(cmd) => self.handle_add_resolved(cmd),
            CartCommand::SetQuantity(cmd) => self.handle_set_quantity(cmd),
            CartCommand::RemoveLine(cmd) => self.handle_remove_line(cmd),
            CartCommand::ClearCart(cmd) => self.handle_clear(cmd),
        }
    }
}

impl Cart {
    fn ensure_cart_id(&self, cart_id: CartId) -> Result<(), DomainError> {
        if self.id != cart_id {
            return Err(DomainError::invariant("cart_id mismatch"));
        }
        Ok(())
    }

    fn handle_add_resolved(&self, cmd: &AddResolved) -> Result<Vec<CartEvent>, DomainError> {
        self.ensure_cart_id(cmd.cart_id)?;

        // The catalog ranks exact matches ahead of the prefix fallback.
        let incoming = cmd.products.first().ok_or_else(DomainError::not_found)?;

        let event = match self.lines.iter().find(|l| l.matches(incoming)) {
            Some(line) => CartEvent::LineIncremented(LineIncremented {
                cart_id: cmd.cart_id,
                line_id: *line.id(),
                quantity: line.quantity().saturating_add(1),
                occurred_at: cmd.occurred_at,
            }),
            None => CartEvent::LineAdded(LineAdded {
                cart_id: cmd.cart_id,
                product: incoming.clone(),
                occurred_at: cmd.occurred_at,
            }),
        };

        Ok(vec![event])
    }

    fn handle_set_quantity(&self, cmd: &SetQuantity) -> Result<Vec<CartEvent>, DomainError> {
        self.ensure_cart_id(cmd.cart_id)?;

        if self.position(&cmd.line_id).is_none() {
            return Ok(Vec::new());
        }

        Ok(vec![CartEvent::QuantitySet(QuantitySet {
            cart_id: cmd.cart_id,
            line_id: cmd.line_id,
            quantity: clamp_quantity(cmd.requested),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_line(&self, cmd: &RemoveLine) -> Result<Vec<CartEvent>, DomainError> {
        self.ensure_cart_id(cmd.cart_id)?;

        if self.position(&cmd.line_id).is_none() {
            return Ok(Vec::new());
        }

        Ok(vec![CartEvent::LineRemoved(LineRemoved {
            cart_id: cmd.cart_id,
            line_id: cmd.line_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_clear(&self, cmd: &ClearCart) -> Result<Vec<CartEvent>, DomainError> {
        self.ensure_cart_id(cmd.cart_id)?;

        Ok(vec![CartEvent::CartCleared(CartCleared {
            cart_id: cmd.cart_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, barcode: &str, price: u64) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(),
            name: name.to_string(),
            barcode: barcode.to_string(),
            price: Money::from_major(price),
            created_at: now,
            updated_at: now,
        }
    }

    fn milk() -> Product {
        product("Milk", "123456", 50)
    }

    fn quantities(cart: &Cart) -> Vec<(String, u32)> {
        cart.lines()
            .iter()
            .map(|l| (l.product().name.clone(), l.quantity()))
            .collect()
    }

    #[test]
    fn first_scan_adds_line_with_quantity_one() {
        let mut cart = Cart::new(CartId::new());
        let milk = milk();

        let events = cart.apply_resolution(&[milk.clone()]).unwrap();

        assert_eq!(events.len(), 1);
        match &events[0] {
            CartEvent::LineAdded(e) => assert_eq!(e.product, milk),
            _ => panic!("Expected LineAdded event"),
        }
        let line = cart.line(&milk.id).unwrap();
        assert_eq!(line.quantity(), 1);
        assert_eq!(line.subtotal(), Money::from_major(50));
        assert_eq!(cart.total(), Money::from_major(50));
    }

    #[test]
    fn repeat_scan_increments_same_line() {
        let mut cart = Cart::new(CartId::new());
        let milk = milk();

        cart.apply_resolution(&[milk.clone()]).unwrap();
        cart.apply_resolution(&[milk.clone()]).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity(), 2);
        assert_eq!(cart.lines()[0].subtotal(), Money::from_major(100));
        assert_eq!(cart.total(), Money::from_major(100));
    }

    #[test]
    fn only_first_product_of_result_is_merged() {
        let mut cart = Cart::new(CartId::new());
        let first = product("Seven", "777", 20);
        let second = product("777", "111", 10);

        cart.apply_resolution(&[first.clone(), second]).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].product(), &first);
    }

    #[test]
    fn merge_moves_touched_line_to_front() {
        let mut cart = Cart::new(CartId::new());
        let milk = milk();
        let bread = product("Bread", "222333", 30);
        let eggs = product("Eggs", "444555", 25);

        cart.apply_resolution(&[milk.clone()]).unwrap();
        cart.apply_resolution(&[bread]).unwrap();
        cart.apply_resolution(&[eggs]).unwrap();
        assert_eq!(
            quantities(&cart),
            vec![("Eggs".to_string(), 1), ("Bread".to_string(), 1), ("Milk".to_string(), 1)]
        );

        cart.apply_resolution(&[milk]).unwrap();
        assert_eq!(
            quantities(&cart),
            vec![("Milk".to_string(), 2), ("Eggs".to_string(), 1), ("Bread".to_string(), 1)]
        );
    }

    #[test]
    fn merge_collapses_changed_barcode_with_same_id() {
        let mut cart = Cart::new(CartId::new());
        let milk = milk();
        cart.apply_resolution(&[milk.clone()]).unwrap();

        let rebarcoded = Product { barcode: "654321".to_string(), ..milk.clone() };
        cart.apply_resolution(&[rebarcoded]).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity(), 2);
        // The first-scanned snapshot is kept.
        assert_eq!(cart.lines()[0].product().barcode, "123456");
    }

    #[test]
    fn merge_collapses_same_barcode_with_different_id() {
        let mut cart = Cart::new(CartId::new());
        let milk = milk();
        cart.apply_resolution(&[milk.clone()]).unwrap();

        let reissued = Product { id: ProductId::new(), ..milk.clone() };
        cart.apply_resolution(&[reissued]).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].id(), &milk.id);
        assert_eq!(cart.lines()[0].quantity(), 2);
    }

    #[test]
    fn empty_resolution_is_not_found_and_leaves_cart_unchanged() {
        let mut cart = Cart::new(CartId::new());
        cart.apply_resolution(&[milk()]).unwrap();
        let before = cart.clone();

        let err = cart.apply_resolution(&[]).unwrap_err();

        assert_eq!(err, DomainError::NotFound);
        assert_eq!(cart, before);
    }

    #[test]
    fn set_quantity_clamps_non_positive_to_one() {
        let mut cart = Cart::new(CartId::new());
        let milk = milk();
        cart.apply_resolution(&[milk.clone()]).unwrap();
        cart.apply_resolution(&[milk.clone()]).unwrap();

        let events = cart.set_quantity(milk.id, -3).unwrap();

        match &events[0] {
            CartEvent::QuantitySet(e) => assert_eq!(e.quantity, 1),
            _ => panic!("Expected QuantitySet event"),
        }
        assert_eq!(cart.lines()[0].quantity(), 1);
        assert_eq!(cart.lines()[0].subtotal(), Money::from_major(50));
        assert_eq!(cart.total(), Money::from_major(50));

        cart.set_quantity(milk.id, 0).unwrap();
        assert_eq!(cart.lines()[0].quantity(), 1);
    }

    #[test]
    fn set_quantity_does_not_reorder() {
        let mut cart = Cart::new(CartId::new());
        let milk = milk();
        let bread = product("Bread", "222333", 30);
        cart.apply_resolution(&[milk.clone()]).unwrap();
        cart.apply_resolution(&[bread]).unwrap();

        cart.set_quantity(milk.id, 5).unwrap();

        assert_eq!(quantities(&cart), vec![("Bread".to_string(), 1), ("Milk".to_string(), 5)]);
        assert_eq!(cart.total(), Money::from_major(30 + 5 * 50));
    }

    #[test]
    fn set_quantity_on_unknown_line_is_a_no_op() {
        let mut cart = Cart::new(CartId::new());
        cart.apply_resolution(&[milk()]).unwrap();
        let before = cart.clone();

        let events = cart.set_quantity(ProductId::new(), 4).unwrap();

        assert!(events.is_empty());
        assert_eq!(cart, before);
    }

    #[test]
    fn remove_line_item_is_idempotent() {
        let mut cart = Cart::new(CartId::new());
        let milk = milk();
        cart.apply_resolution(&[milk.clone()]).unwrap();

        let events = cart.remove_line_item(milk.id).unwrap();
        assert_eq!(events.len(), 1);
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Money::ZERO);

        let events = cart.remove_line_item(milk.id).unwrap();
        assert!(events.is_empty());
        assert!(cart.is_empty());
    }

    #[test]
    fn clear_twice_yields_same_empty_state() {
        let mut cart = Cart::new(CartId::new());
        cart.apply_resolution(&[milk()]).unwrap();
        cart.apply_resolution(&[product("Bread", "222333", 30)]).unwrap();

        cart.clear().unwrap();
        let once = cart.snapshot();
        cart.clear().unwrap();
        let twice = cart.snapshot();

        assert_eq!(once, twice);
        assert!(twice.lines.is_empty());
        assert_eq!(twice.total, Money::ZERO);
    }

    #[test]
    fn snapshot_carries_derived_subtotals_and_total() {
        let mut cart = Cart::new(CartId::new());
        let milk = milk();
        cart.apply_resolution(&[milk.clone()]).unwrap();
        cart.set_quantity(milk.id, 3).unwrap();

        let snapshot = cart.snapshot();

        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines[0].product_id, milk.id);
        assert_eq!(snapshot.lines[0].quantity, 3);
        assert_eq!(snapshot.lines[0].subtotal, Money::from_major(150));
        assert_eq!(snapshot.total, Money::from_major(150));
    }

    #[test]
    fn handle_rejects_foreign_cart_id() {
        let cart = Cart::new(CartId::new());
        let cmd = CartCommand::ClearCart(ClearCart {
            cart_id: CartId::new(),
            occurred_at: Utc::now(),
        });

        match cart.handle(&cmd).unwrap_err() {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected InvariantViolation error for cart_id mismatch"),
        }
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let mut cart = Cart::new(CartId::new());
        cart.apply_resolution(&[milk()]).unwrap();
        let before = cart.clone();

        let cmd = CartCommand::AddResolved(AddResolved {
            cart_id: cart.id_typed(),
            products: vec![milk()],
            occurred_at: Utc::now(),
        });
        let events1 = cart.handle(&cmd).unwrap();
        let events2 = cart.handle(&cmd).unwrap();

        assert_eq!(cart, before);
        assert_eq!(events1, events2);
    }

    #[test]
    fn version_increments_per_applied_event() {
        let mut cart = Cart::new(CartId::new());
        let milk = milk();
        assert_eq!(cart.version(), 0);

        cart.apply_resolution(&[milk.clone()]).unwrap();
        assert_eq!(cart.version(), 1);

        cart.remove_line_item(ProductId::new()).unwrap();
        assert_eq!(cart.version(), 1);

        cart.clear().unwrap();
        assert_eq!(cart.version(), 2);
    }

    #[test]
    fn event_types_are_stable() {
        let mut cart = Cart::new(CartId::new());
        let milk = milk();
        let added = cart.apply_resolution(&[milk.clone()]).unwrap();
        let incremented = cart.apply_resolution(&[milk]).unwrap();
        let cleared = cart.clear().unwrap();

        assert_eq!(added[0].event_type(), "cart.line.added");
        assert_eq!(incremented[0].event_type(), "cart.line.incremented");
        assert_eq!(cleared[0].event_type(), "cart.cleared");
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        /// Small catalog with deliberate identity overlaps: `pool[3]` reuses the
        /// id of `pool[0]` under a new barcode, `pool[4]` reuses the barcode of
        /// `pool[1]` under a new id.
        fn pool() -> Vec<Product> {
            let milk = product("Milk", "100", 50);
            let bread = product("Bread", "200", 30);
            let eggs = product("Eggs", "300", 25);
            let milk_rebarcoded = Product {
                barcode: "101".to_string(),
                price: Money::from_major(55),
                ..milk.clone()
            };
            let bread_reissued = Product {
                id: ProductId::new(),
                price: Money::from_major(35),
                ..bread.clone()
            };
            vec![milk, bread, eggs, milk_rebarcoded, bread_reissued]
        }

        #[derive(Debug, Clone)]
        enum Op {
            Scan(usize),
            Miss,
            SetQuantity(usize, i64),
            Remove(usize),
            Clear,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                4 => (0usize..5).prop_map(Op::Scan),
                1 => Just(Op::Miss),
                2 => (0usize..5, -5i64..10).prop_map(|(i, q)| Op::SetQuantity(i, q)),
                1 => (0usize..5).prop_map(Op::Remove),
                1 => Just(Op::Clear),
            ]
        }

        fn run(cart: &mut Cart, pool: &[Product], op: &Op) {
            match op {
                Op::Scan(i) => {
                    cart.apply_resolution(&[pool[*i].clone()]).unwrap();
                }
                Op::Miss => {
                    let _ = cart.apply_resolution(&[]);
                }
                Op::SetQuantity(i, q) => {
                    cart.set_quantity(pool[*i].id, *q).unwrap();
                }
                Op::Remove(i) => {
                    cart.remove_line_item(pool[*i].id).unwrap();
                }
                Op::Clear => {
                    cart.clear().unwrap();
                }
            }
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: every reachable cart keeps its invariants.
            #[test]
            fn invariants_hold_for_any_operation_sequence(
                ops in prop::collection::vec(op(), 0..40)
            ) {
                let pool = pool();
                let mut cart = Cart::new(CartId::new());

                for op in &ops {
                    run(&mut cart, &pool, op);

                    let expected: u64 = cart
                        .lines()
                        .iter()
                        .map(|l| u64::from(l.quantity()) * l.unit_price().minor_units())
                        .sum();
                    prop_assert_eq!(cart.total().minor_units(), expected);

                    let snapshot = cart.snapshot();
                    prop_assert_eq!(snapshot.total, cart.total());

                    let mut ids = HashSet::new();
                    let mut barcodes = HashSet::new();
                    for line in cart.lines() {
                        prop_assert!(line.quantity() >= 1);
                        prop_assert!(ids.insert(*line.id()), "duplicate product id");
                        prop_assert!(
                            barcodes.insert(line.product().barcode.clone()),
                            "duplicate barcode"
                        );
                    }
                }
            }

            /// Property: each scan adds exactly one unit to the cart.
            #[test]
            fn scans_add_exactly_one_unit(scans in prop::collection::vec(0usize..5, 1..30)) {
                let pool = pool();
                let mut cart = Cart::new(CartId::new());

                for (n, i) in scans.iter().enumerate() {
                    cart.apply_resolution(&[pool[*i].clone()]).unwrap();
                    let units: u64 = cart.lines().iter().map(|l| u64::from(l.quantity())).sum();
                    prop_assert_eq!(units, n as u64 + 1);
                }
            }

            /// Property: clear is idempotent from any state.
            #[test]
            fn clear_is_idempotent(ops in prop::collection::vec(op(), 0..20)) {
                let pool = pool();
                let mut cart = Cart::new(CartId::new());
                for op in &ops {
                    run(&mut cart, &pool, op);
                }

                cart.clear().unwrap();
                let once = cart.snapshot();
                cart.clear().unwrap();
                prop_assert_eq!(once, cart.snapshot());
                prop_assert!(cart.is_empty());
            }
        }
    }
}
