//! Pre-built Test Fixtures
//!
//! Reference data matching the seeded schema, request builders with valid
//! defaults, and seeding helpers that write through a unit of work so tests
//! can start from an arbitrary parent/child status layout.

use chrono::NaiveDate;

use core_kernel::{
    ApprovalStatus, CarPartId, ClaimId, ClaimPartId, LifecycleStatus, PortError,
    ProductAllocationId, ProductId, ShopId, StateId, WarrantyId, WarrantyPartId,
};
use domain_claims::{ClaimsPort, NewClaim, NewClaimPart};
use domain_warranty::{
    CarPart, MalaysianState, NewProduct, NewProductAllocation, NewShop, NewWarranty,
    NewWarrantyPart, WarrantyChange, WarrantyPartChange, WarrantyPort,
};

use crate::memory::MemoryGateway;

const STATES: [(&str, &str); 16] = [
    ("Johor", "JH"),
    ("Kedah", "KD"),
    ("Kelantan", "KN"),
    ("Malacca", "ML"),
    ("Negeri Sembilan", "NS"),
    ("Pahang", "PH"),
    ("Penang", "PG"),
    ("Perak", "PR"),
    ("Perlis", "PL"),
    ("Sabah", "SB"),
    ("Sarawak", "SW"),
    ("Selangor", "SG"),
    ("Terengganu", "TR"),
    ("Kuala Lumpur", "KL"),
    ("Putrajaya", "PJ"),
    ("Labuan", "LB"),
];

const CAR_PARTS: [(&str, &str); 9] = [
    ("Front Windscreen", "FWS"),
    ("Front Right", "R1"),
    ("Front Left", "L1"),
    ("Rear Right", "R2"),
    ("Rear Left", "L2"),
    ("Rear Windscreen", "RWS"),
    ("Sunroof", "Sunroof"),
    ("Front Bumper", "FB"),
    ("Rear Bumper", "RB"),
];

/// Johor, the first seeded state
pub const JOHOR: StateId = StateId::new(1);
/// Front windscreen, the first seeded car part
pub const FRONT_WINDSCREEN: CarPartId = CarPartId::new(1);

/// Stock allocation made for the first shop seeded by [`seed_shop`]
pub const FIRST_ALLOCATION: ProductAllocationId = ProductAllocationId::new(1);

/// The seeded Malaysian states, ids 1..=16
pub fn malaysian_states() -> Vec<MalaysianState> {
    STATES
        .iter()
        .zip(1..)
        .map(|((name, code), id)| MalaysianState {
            id: StateId::new(id),
            name: name.to_string(),
            code: code.to_string(),
        })
        .collect()
}

/// The seeded car parts, ids 1..=9
pub fn car_parts() -> Vec<CarPart> {
    CAR_PARTS
        .iter()
        .zip(1..)
        .map(|((name, code), id)| CarPart {
            id: CarPartId::new(id),
            name: name.to_string(),
            code: code.to_string(),
            description: None,
        })
        .collect()
}

/// Seeded id of the car part with this code
///
/// # Panics
///
/// Panics on an unknown code
pub fn car_part(code: &str) -> CarPartId {
    let index = CAR_PARTS
        .iter()
        .position(|(_, c)| *c == code)
        .unwrap_or_else(|| panic!("unknown car part code {code}"));
    CarPartId::new(index as i32 + 1)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_else(|| panic!("invalid date {y}-{m}-{d}"))
}

/// A valid shop registration in Johor without a branch code
pub fn new_shop(name: &str) -> NewShop {
    NewShop {
        company_name: format!("{name} Sdn Bhd"),
        company_registration_number: "202401012345".into(),
        company_license_image_url: "https://cdn.example.com/company_licenses/ssm.jpg".into(),
        company_contact_number: "+60 7-222 1234".into(),
        company_email: "office@example.com".into(),
        company_website_url: "https://example.com".into(),
        shop_name: name.into(),
        shop_address: "12 Jalan Tebrau, Johor Bahru".into(),
        msia_state_id: Some(JOHOR),
        branch_code: None,
        shop_image_url: "https://cdn.example.com/shop_images/front.jpg".into(),
        pic_name: "Aisyah Rahman".into(),
        pic_position: "Manager".into(),
        pic_contact_number: "+60 12-345 6789".into(),
        pic_email: "aisyah@example.com".into(),
    }
}

/// A valid film product registration
pub fn new_product(serial: &str) -> NewProduct {
    NewProduct {
        brand: "Profilm".into(),
        film_type: "Solar Film".into(),
        series: "Ceramic".into(),
        name: "CX70".into(),
        warranty_in_months: 60,
        film_serial_number: serial.into(),
        film_quantity: 30,
        shipment_number: "SHP-2411".into(),
        description: "70% VLT ceramic".into(),
    }
}

pub fn new_allocation(product: ProductId, shop: ShopId) -> NewProductAllocation {
    NewProductAllocation {
        product_id: product,
        shop_id: shop,
        film_quantity: 10,
        allocation_date: date(2024, 11, 1),
    }
}

/// A valid warranty registration without a warranty number
pub fn new_warranty(shop: ShopId, installation_date: NaiveDate) -> NewWarranty {
    NewWarranty {
        shop_id: shop,
        client_name: "Tan Wei Ming".into(),
        client_contact: "+60 16-111 2222".into(),
        client_email: "weiming@example.com".into(),
        car_brand: "Perodua".into(),
        car_model: "Myvi".into(),
        car_colour: "Red".into(),
        car_plate_no: "JQA 1234".into(),
        car_chassis_no: "PM2M602S001234567".into(),
        installation_date,
        reference_no: None,
        warranty_no: None,
        invoice_attachment_url: "https://cdn.example.com/invoices/inv-1.pdf".into(),
    }
}

/// The change that rewrites a warranty with its current customer fields
pub fn warranty_change(installation_date: NaiveDate) -> WarrantyChange {
    let base = new_warranty(ShopId::new(0), installation_date);
    WarrantyChange {
        client_name: base.client_name,
        client_contact: base.client_contact,
        client_email: base.client_email,
        car_brand: base.car_brand,
        car_model: base.car_model,
        car_colour: "Blue".into(),
        car_plate_no: base.car_plate_no,
        car_chassis_no: base.car_chassis_no,
        installation_date,
        reference_no: Some("REF-2".into()),
        invoice_attachment_url: base.invoice_attachment_url,
    }
}

pub fn new_warranty_part(car_part: CarPartId) -> NewWarrantyPart {
    NewWarrantyPart {
        product_allocation_id: FIRST_ALLOCATION,
        car_part_id: car_part,
        installation_image_url: format!("https://cdn.example.com/installation_images/{car_part}.jpg"),
    }
}

pub fn warranty_part_change(id: Option<WarrantyPartId>, car_part: CarPartId) -> WarrantyPartChange {
    WarrantyPartChange {
        id,
        product_allocation_id: FIRST_ALLOCATION,
        car_part_id: car_part,
        installation_image_url: format!("https://cdn.example.com/installation_images/{car_part}-v2.jpg"),
    }
}

pub fn new_claim(warranty: WarrantyId, claim_date: NaiveDate) -> NewClaim {
    NewClaim {
        warranty_id: warranty,
        claim_no: None,
        claim_date,
    }
}

pub fn new_claim_part(warranty_part: WarrantyPartId) -> NewClaimPart {
    NewClaimPart {
        warranty_part_id: warranty_part,
        damaged_image_url: format!("https://cdn.example.com/damaged_images/{warranty_part}.jpg"),
        remarks: Some("Bubbling near the edge".into()),
        resolution_date: None,
        resolution_image_url: None,
    }
}

/// A committed shop with a fixed branch code, stocked with one product
///
/// The first shop seeded into a gateway receives [`FIRST_ALLOCATION`].
pub async fn seed_shop(gateway: &MemoryGateway, branch_code: &str) -> Result<ShopId, PortError> {
    let mut uow = WarrantyPort::begin(gateway).await?;
    let mut shop = new_shop(branch_code);
    shop.branch_code = Some(branch_code.to_string());
    let created = uow.insert_shop(shop).await?;
    let product = uow
        .insert_product(new_product(&format!("CX70-{branch_code}")))
        .await?;
    uow.insert_product_allocation(new_allocation(product.id, created.id))
        .await?;
    uow.commit().await?;
    Ok(created.id)
}

/// Stocks an existing shop with a fresh product
pub async fn seed_stock(
    gateway: &MemoryGateway,
    shop: ShopId,
    serial: &str,
) -> Result<ProductAllocationId, PortError> {
    let mut uow = WarrantyPort::begin(gateway).await?;
    let product = uow.insert_product(new_product(serial)).await?;
    let allocation = uow
        .insert_product_allocation(new_allocation(product.id, shop))
        .await?;
    uow.commit().await?;
    Ok(allocation.id)
}

/// A committed warranty whose parts carry the given approvals
///
/// The warranty's own approval is written as given, without aggregation, so
/// tests can start from any layout.
pub async fn seed_warranty(
    gateway: &MemoryGateway,
    shop: ShopId,
    warranty_no: &str,
    parent: ApprovalStatus,
    parts: &[(CarPartId, ApprovalStatus)],
) -> Result<(WarrantyId, Vec<WarrantyPartId>), PortError> {
    let mut uow = WarrantyPort::begin(gateway).await?;
    let mut warranty = new_warranty(shop, date(2024, 11, 25));
    warranty.warranty_no = Some(warranty_no.to_string());
    let created = uow.insert_warranty(warranty).await?;
    uow.set_warranty_approval(created.id, parent).await?;

    let mut ids = Vec::with_capacity(parts.len());
    for (car_part, status) in parts {
        let part = uow
            .insert_warranty_part(created.id, new_warranty_part(*car_part))
            .await?;
        uow.set_warranty_part_approval(part.id, *status).await?;
        ids.push(part.id);
    }
    uow.commit().await?;
    Ok((created.id, ids))
}

/// A committed claim whose parts carry the given statuses, one per
/// warranty part
pub async fn seed_claim(
    gateway: &MemoryGateway,
    warranty: WarrantyId,
    claim_no: &str,
    parent: (ApprovalStatus, LifecycleStatus),
    parts: &[(WarrantyPartId, ApprovalStatus, LifecycleStatus)],
) -> Result<(ClaimId, Vec<ClaimPartId>), PortError> {
    let mut uow = ClaimsPort::begin(gateway).await?;
    let mut claim = new_claim(warranty, date(2024, 12, 1));
    claim.claim_no = Some(claim_no.to_string());
    let created = uow.insert_claim(claim).await?;
    uow.set_claim_approval(created.id, parent.0).await?;
    uow.set_claim_status(created.id, parent.1).await?;

    let mut ids = Vec::with_capacity(parts.len());
    for (warranty_part, approval, status) in parts {
        let part = uow
            .insert_claim_part(created.id, new_claim_part(*warranty_part))
            .await?;
        uow.set_claim_part_approval(part.id, *approval).await?;
        uow.set_claim_part_status(part.id, *status).await?;
        ids.push(part.id);
    }
    uow.commit().await?;
    Ok((created.id, ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_data_ids() {
        let states = malaysian_states();
        assert_eq!(states.len(), 16);
        assert_eq!(states[0].id, JOHOR);
        assert_eq!(states[0].code, "JH");
        assert_eq!(car_parts()[0].id, FRONT_WINDSCREEN);
        assert_eq!(car_part("RB"), CarPartId::new(9));
    }

    #[test]
    fn test_builders_are_valid() {
        assert!(new_shop("Tint Pro").validate().is_ok());
        assert!(new_product("CX70-0001").validate().is_ok());
        assert!(new_allocation(ProductId::new(1), ShopId::new(1))
            .validate()
            .is_ok());
        let parts = vec![new_warranty_part(car_part("FWS")), new_warranty_part(car_part("R1"))];
        assert!(new_warranty(ShopId::new(1), date(2024, 11, 25))
            .validate(&parts)
            .is_ok());
    }
}
