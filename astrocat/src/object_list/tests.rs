//! Tests for the object list container.

use super::*;
use crate::geometry::BoundingBox;
use crate::image::SegmentationMap;

fn square_pixels(x0: i32, y0: i32, side: i32, value: f32) -> Vec<PixelSample> {
    let mut pixels = Vec::new();
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            pixels.push(PixelSample::new(x, y, value, value));
        }
    }
    pixels
}

fn object(number: u32, raw: f64) -> ObjectRecord {
    ObjectRecord {
        rawvalue: raw,
        totalvalue: raw,
        totalvar: raw / 10.0,
        maxflux: raw / 4.0,
        scannb: 1,
        ..ObjectRecord::new(number)
    }
}

#[test]
fn test_push_sets_range_pixnb_and_bbox() {
    let mut list = ObjectList::new();
    let i0 = list.push(object(1, 10.0), &square_pixels(0, 0, 2, 1.0)).unwrap();
    let i1 = list.push(object(2, 20.0), &square_pixels(5, 6, 3, 1.0)).unwrap();

    assert_eq!((i0, i1), (0, 1));
    let second = list.get(1).unwrap();
    assert_eq!(second.pixels, PixelRange { start: 4, len: 9 });
    assert_eq!(second.pixnb, 9);
    assert_eq!(second.bbox, BoundingBox::new(5, 7, 6, 8));
    assert_eq!(second.height, 3);
    assert_eq!(list.arena_len(), 13);
}

#[test]
fn test_push_keeps_explicit_bbox() {
    let mut list = ObjectList::new();
    let record = ObjectRecord {
        bbox: BoundingBox::new(-2, 10, -2, 10),
        ..object(1, 1.0)
    };
    list.push(record, &square_pixels(0, 0, 1, 1.0)).unwrap();
    assert_eq!(list.get(0).unwrap().bbox, BoundingBox::new(-2, 10, -2, 10));
}

#[test]
fn test_copy_object_is_deep() {
    let mut src = ObjectList::new();
    src.push(object(1, 10.0), &square_pixels(0, 0, 2, 1.0)).unwrap();
    src.push(object(2, 20.0), &square_pixels(4, 4, 2, 2.0)).unwrap();

    let mut dst = ObjectList::new();
    dst.push(object(9, 1.0), &square_pixels(10, 10, 1, 3.0))
        .unwrap();

    let index = copy_object(1, &src, &mut dst).unwrap();
    assert_eq!(index, 1);
    assert_eq!(dst.len(), 2);
    assert_eq!(dst.get(1).unwrap().number, 2);
    assert_eq!(dst.get(1).unwrap().rawvalue, 20.0);
    assert_eq!(dst.pixels_of(1).unwrap(), src.pixels_of(1).unwrap());
    // The copy lives in the destination arena
    assert_eq!(dst.get(1).unwrap().pixels.start, 1);
}

#[test]
fn test_copy_object_out_of_range() {
    let src = ObjectList::new();
    let mut dst = ObjectList::new();
    let err = copy_object(3, &src, &mut dst).unwrap_err();
    assert!(matches!(err, Error::IndexOutOfRange { index: 3, len: 0 }));
    assert!(dst.is_empty());
}

#[test]
fn test_contains_uses_first_core_pixel() {
    let mut list = ObjectList::new();
    list.push(object(1, 1.0), &square_pixels(0, 0, 5, 1.0)).unwrap();
    list.push(object(2, 1.0), &square_pixels(2, 2, 2, 1.0)).unwrap();
    // First pixel (4, 4) inside the shell, rest outside
    list.push(object(3, 1.0), &square_pixels(4, 4, 3, 1.0)).unwrap();
    list.push(object(4, 1.0), &square_pixels(20, 20, 1, 1.0)).unwrap();

    assert!(contains(1, &list, 0, &list).unwrap());
    assert!(contains(2, &list, 0, &list).unwrap());
    assert!(!contains(3, &list, 0, &list).unwrap());
    assert!(!contains(0, &list, 1, &list).unwrap());
}

#[test]
fn test_contains_across_lists_and_empty_core() {
    let mut a = ObjectList::new();
    a.push(object(1, 1.0), &[]).unwrap();
    a.push(object(2, 1.0), &square_pixels(1, 1, 1, 1.0)).unwrap();
    let mut b = ObjectList::new();
    b.push(object(3, 1.0), &square_pixels(0, 0, 3, 1.0)).unwrap();

    assert!(!contains(0, &a, 0, &b).unwrap());
    assert!(contains(1, &a, 0, &b).unwrap());
    assert!(contains(5, &a, 0, &b).is_err());
}

#[test]
fn test_remove_swaps_last_into_slot() {
    let mut list = ObjectList::new();
    for n in 1..=4 {
        list.push(object(n, n as f64), &square_pixels(n as i32 * 3, 0, 2, 1.0))
            .unwrap();
    }
    let pixels_of_last = list.pixels_of(3).unwrap().to_vec();

    let removed = list.remove(1).unwrap();
    assert_eq!(removed.number, 2);
    assert_eq!(list.len(), 3);
    assert_eq!(list.get(1).unwrap().number, 4);
    // The moved record still points at its own pixels
    assert_eq!(list.pixels_of(1).unwrap(), pixels_of_last.as_slice());
    assert_eq!(list.get(0).unwrap().number, 1);
}

#[test]
fn test_remove_last_releases_arena() {
    let mut list = ObjectList::new();
    list.push(object(1, 1.0), &square_pixels(0, 0, 4, 1.0)).unwrap();
    list.remove(0).unwrap();
    assert!(list.is_empty());
    assert_eq!(list.arena_len(), 0);
}

#[test]
fn test_remove_out_of_range() {
    let mut list = ObjectList::new();
    list.push(object(1, 1.0), &[]).unwrap();
    assert!(matches!(
        list.remove(1),
        Err(Error::IndexOutOfRange { index: 1, len: 1 })
    ));
    assert_eq!(list.len(), 1);
}

#[test]
fn test_remove_then_admit_preserves_fields() {
    let mut list = ObjectList::new();
    for n in 1..=3 {
        list.push(object(n, n as f64 * 10.0), &square_pixels(n as i32 * 4, 0, 2, 1.0))
            .unwrap();
    }
    let original = list.get(0).unwrap().clone();
    let original_pixels = list.pixels_of(0).unwrap().to_vec();

    let removed = list.remove(0).unwrap();
    let index = list.push(removed, &original_pixels).unwrap();

    assert_eq!(list.len(), 3);
    let readmitted = list.get(index).unwrap();
    assert_eq!(readmitted.number, original.number);
    assert_eq!(readmitted.rawvalue, original.rawvalue);
    assert_eq!(readmitted.totalvar, original.totalvar);
    assert_eq!(readmitted.bbox, original.bbox);
    assert_eq!(readmitted.pixnb, original.pixnb);
    assert_eq!(list.pixels_of(index).unwrap(), original_pixels.as_slice());
}

#[test]
fn test_absorb_relocates_run_and_accumulates() {
    let mut list = ObjectList::new();
    list.push(object(1, 10.0), &square_pixels(0, 0, 2, 1.0)).unwrap();
    list.push(object(2, 20.0), &square_pixels(10, 10, 2, 1.0)).unwrap();

    let mut other = ObjectList::new();
    other.push(object(3, 5.0), &square_pixels(3, 0, 1, 7.0)).unwrap();
    let slave = other.get(0).unwrap().clone();

    list.absorb(0, &slave, other.pixels_of(0).unwrap(), None)
        .unwrap();

    let master = list.get(0).unwrap();
    assert_eq!(master.pixnb, 5);
    assert_eq!(master.pixels.len, 5);
    assert_eq!(master.pixels.start, 8);
    assert_eq!(master.rawvalue, 15.0);
    assert_eq!(master.bbox, BoundingBox::new(0, 3, 0, 1));
    assert_eq!(list.pixels_of(0).unwrap()[4].value, 7.0);
    // The untouched neighbour keeps its run
    assert_eq!(list.pixels_of(1).unwrap()[0].x, 10);
}

#[test]
fn test_absorb_extends_in_place_when_last() {
    let mut list = ObjectList::new();
    list.push(object(1, 10.0), &square_pixels(0, 0, 2, 1.0)).unwrap();
    let slave = object(2, 1.0);
    let slave_pixels = square_pixels(2, 0, 1, 1.0);
    let slave = ObjectRecord {
        pixnb: slave_pixels.len(),
        ..slave
    };

    list.absorb(0, &slave, &slave_pixels, None).unwrap();
    assert_eq!(list.get(0).unwrap().pixels, PixelRange { start: 0, len: 5 });
    assert_eq!(list.arena_len(), 5);
}

#[test]
fn test_absorb_relabels_segmentation() {
    let mut list = ObjectList::new();
    list.push(object(1, 10.0), &square_pixels(0, 0, 2, 1.0)).unwrap();

    let mut other = ObjectList::new();
    other.push(object(2, 4.0), &square_pixels(3, 3, 2, 1.0)).unwrap();

    let mut map = SegmentationMap::new(8, 8);
    for p in other.pixels_of(0).unwrap() {
        map.set(p.x, p.y, 2);
    }

    list.absorb(
        0,
        other.get(0).unwrap(),
        other.pixels_of(0).unwrap(),
        Some(&mut map),
    )
    .unwrap();

    assert!(map.labels().iter().all(|&l| l != 2));
    assert_eq!(map.get(3, 3), Some(1));
    assert_eq!(map.get(4, 4), Some(1));
}

#[test]
fn test_merge_does_not_inherit_merged_or_crowded() {
    let mut master = object(1, 10.0);
    let slave = ObjectRecord {
        flags: ObjectFlags::MERGED | ObjectFlags::CROWDED | ObjectFlags::SATURATED,
        ..object(2, 5.0)
    };
    master.merge_from(&slave);
    assert!(master.flags.contains(ObjectFlags::SATURATED));
    assert!(!master.flags.contains(ObjectFlags::MERGED));
    assert!(!master.flags.contains(ObjectFlags::CROWDED));
}

#[test]
fn test_merge_keeps_own_merged_flag() {
    let mut master = ObjectRecord {
        flags: ObjectFlags::MERGED,
        ..object(1, 10.0)
    };
    master.merge_from(&object(2, 1.0));
    assert!(master.flags.contains(ObjectFlags::MERGED));
}

#[test]
fn test_merge_maxflux_and_height() {
    let mut master = ObjectRecord {
        maxflux: 3.0,
        bbox: BoundingBox::new(0, 2, 0, 2),
        height: 3,
        ..object(1, 10.0)
    };
    let slave = ObjectRecord {
        maxflux: 8.0,
        bbox: BoundingBox::new(1, 4, 5, 9),
        ..object(2, 1.0)
    };
    master.merge_from(&slave);
    assert_eq!(master.maxflux, 8.0);
    assert_eq!(master.bbox, BoundingBox::new(0, 4, 0, 9));
    assert_eq!(master.height, 10);
}

#[test]
fn test_merge_accumulation_is_order_independent() {
    let a = ObjectRecord {
        pixnb: 3,
        ..object(1, 11.0)
    };
    let b = ObjectRecord {
        pixnb: 7,
        ..object(2, 23.0)
    };
    let c = ObjectRecord {
        pixnb: 5,
        ..object(3, 37.0)
    };

    // A into B, then B into C
    let mut b1 = b.clone();
    b1.merge_from(&a);
    let mut c1 = c.clone();
    c1.merge_from(&b1);

    // B into A, then C into A
    let mut a2 = a.clone();
    a2.merge_from(&b);
    a2.merge_from(&c);

    assert_eq!(c1.rawvalue, a2.rawvalue);
    assert_eq!(c1.totalvalue, a2.totalvalue);
    assert_eq!(c1.totalvar, a2.totalvar);
    assert_eq!(c1.pixnb, a2.pixnb);
    assert_eq!(c1.pixnb, 15);
}

#[test]
fn test_compact_drops_orphaned_runs() {
    let mut list = ObjectList::new();
    for n in 1..=3 {
        list.push(object(n, 1.0), &square_pixels(n as i32 * 5, 0, 2, n as f32))
            .unwrap();
    }
    list.remove(0).unwrap();
    let slave = list.get(1).unwrap().clone();
    let slave_pixels = list.pixels_of(1).unwrap().to_vec();
    list.absorb(0, &slave, &slave_pixels, None).unwrap();
    list.remove(1).unwrap();
    assert!(list.arena_len() > 8);

    let before = list.pixels_of(0).unwrap().to_vec();
    list.compact().unwrap();
    assert_eq!(list.arena_len(), 8);
    assert_eq!(list.get(0).unwrap().pixels.start, 0);
    assert_eq!(list.pixels_of(0).unwrap(), before.as_slice());
}
