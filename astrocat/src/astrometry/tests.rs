//! Tests for the astrometric transforms.

use super::*;
use crate::testing::{SyntheticSource, init_tracing};

fn object(x: f64, y: f64, a: f64, b: f64, theta: f64) -> ObjectRecord {
    let (mut record, pixels) = SyntheticSource {
        number: 1,
        x,
        y,
        a,
        b,
        theta,
        flux: 1000.0,
        thresh: 5.0,
    }
    .build();
    record.pixnb = pixels.len();
    record
}

fn linear(header: LinearHeader) -> Astrometry {
    Astrometry::new(&Projection::Linear(header), &Config::default())
}

fn angle_diff(a: f64, b: f64) -> f64 {
    (a - b + 90.0).rem_euclid(180.0) - 90.0
}

// ============================================================================
// Linear
// ============================================================================

#[test]
fn test_unrotated_unit_scale_is_offset() {
    let astrometry = linear(LinearHeader {
        crval: [100.0, 200.0],
        crpix: [1.0, 1.0],
        ..Default::default()
    });
    let mut record = object(10.0, 20.0, 2.0, 1.0, 25.0);
    astrometry.transform(&mut record);

    // Pixel (10, 20) is (11, 21) in 1-based coordinates
    assert!((record.world.mxw - 110.0).abs() < 1e-12);
    assert!((record.world.myw - 220.0).abs() < 1e-12);
    assert!((record.world.aw - 2.0).abs() < 1e-12);
    assert!((record.world.bw - 1.0).abs() < 1e-12);
    assert!(angle_diff(record.world.thetaw, 25.0).abs() < 1e-9);
}

#[test]
fn test_singular_rotation_falls_back_to_identity() {
    init_tracing();
    let header = LinearHeader {
        crval: [5.0, 7.0],
        crota: [0.0, 90.0],
        ..Default::default()
    };
    let astrometry = linear(header);
    assert!(astrometry.is_singular());

    let mut record = object(3.0, 4.0, 1.0, 1.0, 0.0);
    astrometry.transform(&mut record);
    assert!((record.world.mxw - 8.0).abs() < 1e-12);
    assert!((record.world.myw - 11.0).abs() < 1e-12);
}

#[test]
fn test_rotation_preserves_distances_and_turns_shape() {
    let header = LinearHeader {
        crval: [0.0, 0.0],
        crpix: [50.0, 50.0],
        crota: [30.0, 30.0],
        ..Default::default()
    };
    let astrometry = linear(header);
    assert!(!astrometry.is_singular());

    let mut record = object(59.0, 49.0, 3.0, 1.0, 10.0);
    astrometry.transform(&mut record);

    let offset = DVec2::new(record.world.mxw, record.world.myw);
    assert!((offset.length() - 10.0).abs() < 1e-9);
    assert!((offset.y.atan2(offset.x).to_degrees() - 30.0).abs() < 1e-9);
    assert!((record.world.aw - 3.0).abs() < 1e-9);
    assert!((record.world.bw - 1.0).abs() < 1e-9);
    assert!(angle_diff(record.world.thetaw, 40.0).abs() < 1e-9);
}

#[test]
fn test_scale_applies_to_shape_area_and_fwhm() {
    let config = Config {
        pixel_scale: 0.5,
        ..Default::default()
    };
    let header = LinearHeader {
        cdelt: [2.0, 2.0],
        ..Default::default()
    };
    let astrometry = Astrometry::new(&Projection::Linear(header), &config);

    let mut record = object(30.0, 30.0, 2.0, 1.5, 0.0);
    astrometry.transform(&mut record);
    assert!((record.world.aw - 4.0).abs() < 1e-12);
    assert!((record.world.bw - 3.0).abs() < 1e-12);
    assert_eq!(record.world.area_world, record.pixnb as f64 * 0.25);
    assert!((record.world.fwhm_world - record.fwhm * 0.5).abs() < 1e-12);
}

#[test]
fn test_unrequested_world_fields_untouched() {
    let config = Config {
        outputs: RequestedOutputs {
            world_position: true,
            ..RequestedOutputs::none()
        },
        ..Default::default()
    };
    let astrometry = Astrometry::new(&Projection::default(), &config);
    let mut record = object(30.0, 30.0, 2.0, 1.5, 0.0);
    astrometry.transform(&mut record);

    assert!((record.world.mxw - 30.0).abs() < 1e-12);
    assert_eq!(record.world.aw, 0.0);
    assert_eq!(record.world.area_world, 0.0);
}

#[test]
fn test_world_shape_of_circle_under_rotation() {
    let jacobian = DMat2::from_angle(0.7);
    let (aw, bw, _) = world_shape(jacobian, 2.0, 2.0, 0.0);
    assert!((aw - 2.0).abs() < 1e-12);
    assert!((bw - 2.0).abs() < 1e-12);
}

// ============================================================================
// Precession
// ============================================================================

#[test]
fn test_precess_same_equinox_is_identity() {
    assert_eq!(precess(2000.0, 41.0, 49.0, 2000.0), (41.0, 49.0));
}

#[test]
fn test_precess_reference_star() {
    // θ Persei from J2000.0 to 2028 Nov 13.19 (Meeus, Astronomical Algorithms)
    let (ra, dec) = precess(2000.0, 41.054063, 49.227750, 2028.86705);
    assert!((ra - 41.547214).abs() < 2e-5, "ra = {}", ra);
    assert!((dec - 49.348483).abs() < 2e-5, "dec = {}", dec);
}

#[test]
fn test_precess_round_trip() {
    for &(ra, dec) in &[(10.0, 20.0), (200.0, -45.0), (359.5, 80.0)] {
        let (ra50, dec50) = precess(2000.0, ra, dec, 1950.0);
        let (back_ra, back_dec) = precess(1950.0, ra50, dec50, 2000.0);
        assert!(angle_diff(back_ra, ra).abs() < 1e-6, "ra {} -> {}", ra, back_ra);
        assert!((back_dec - dec).abs() < 1e-6);
    }
}

// ============================================================================
// Plate
// ============================================================================

fn plate_header() -> PlateHeader {
    let mut amdx = [0.0; 13];
    let mut amdy = [0.0; 13];
    // 1 arcsec per millimetre on both axes
    amdx[0] = 1.0;
    amdy[0] = 1.0;
    PlateHeader {
        ra: 150.0,
        dec: 30.0,
        equinox: 2000.0,
        x_pixel_size: 15.0,
        y_pixel_size: 15.0,
        // Plate centre at 1-based pixel (50, 50)
        ppo3: 49.5 * 15.0,
        ppo6: 49.5 * 15.0,
        x_offset: 0.0,
        y_offset: 0.0,
        amdx,
        amdy,
    }
}

#[test]
fn test_plate_centre_maps_to_plate_position() {
    let plate = PlateTransform::new(&plate_header());
    let standard = plate.standard_coordinates(DVec2::new(50.0, 50.0));
    assert!(standard.length() < 1e-12);

    let astrometry = Astrometry::new(&Projection::Plate(plate_header()), &Config::default());
    let mut record = object(49.0, 49.0, 1.0, 1.0, 0.0);
    astrometry.transform(&mut record);
    assert!((record.world.alpha - 150.0).abs() < 1e-9);
    assert!((record.world.delta - 30.0).abs() < 1e-9);
}

#[test]
fn test_plate_offset_direction() {
    let plate = PlateTransform::new(&plate_header());
    let centre = plate.pixel_to_sky(DVec2::new(50.0, 50.0));

    // One pixel towards -x is +15 µm along ξ
    let east = plate.pixel_to_sky(DVec2::new(49.0, 50.0));
    let expected = 0.015 / 3600.0 / 30.0_f64.to_radians().cos();
    assert!(((east.x - centre.x) / expected - 1.0).abs() < 1e-6);
    assert!((east.y - centre.y).abs() < 1e-9);

    // One pixel towards +y is +15 µm along η
    let north = plate.pixel_to_sky(DVec2::new(50.0, 51.0));
    assert!(((north.y - centre.y) / (0.015 / 3600.0) - 1.0).abs() < 1e-6);
}

#[test]
fn test_plate_world_shape_and_precession() {
    let config = Config {
        output_equinox: 1950.0,
        ..Default::default()
    };
    let astrometry = Astrometry::new(&Projection::Plate(plate_header()), &config);
    let mut record = object(49.0, 49.0, 4.0, 2.0, 0.0);
    astrometry.transform(&mut record);

    // 15 µm pixels at 1 arcsec/mm
    let scale = 0.015 / 3600.0;
    assert!((record.world.aw / (4.0 * scale) - 1.0).abs() < 1e-4);
    assert!((record.world.bw / (2.0 * scale) - 1.0).abs() < 1e-4);

    let (alpha, delta) = precess(2000.0, record.world.mxw, record.world.myw, 1950.0);
    assert_eq!((record.world.alpha, record.world.delta), (alpha, delta));
    assert!((record.world.alpha - 150.0).abs() > 0.1);
}

#[test]
fn test_projection_from_yaml() {
    let yaml = "type: linear\ncrval: [10.0, 20.0]\ncrpix: [1.0, 1.0]\ncdelt: [0.5, 0.5]\ncrota: [0.0, 0.0]\n";
    let projection: Projection = serde_yml::from_str(yaml).unwrap();
    assert!(matches!(projection, Projection::Linear(h) if h.cdelt == [0.5, 0.5]));
}
