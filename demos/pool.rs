use std::io::{IsTerminal, Read};

use rbuddy::{BuddyPool, HEADER_SIZE, MIN_K, PoolStats};

/// Waits until the user presses ENTER.
/// Skipped when stdin is not a terminal so the demo also runs unattended.
fn block_until_enter_pressed() {
  if !std::io::stdin().is_terminal() {
    return;
  }

  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the non-empty free lists, lowest order first.
fn print_free_lists(
  label: &str,
  stats: &PoolStats,
) {
  let lists: Vec<String> = stats
    .free_blocks_per_order
    .iter()
    .enumerate()
    .filter(|&(_, &count)| count > 0)
    .map(|(k, count)| format!("k{k}x{count}"))
    .collect();

  println!(
    "[{}] free = {} bytes, reserved = {} bytes, lists = [{}]",
    label,
    stats.free_bytes,
    stats.reserved_bytes,
    lists.join(", "),
  );
}

fn main() -> rbuddy::Result<()> {
  // RUST_LOG=trace shows every split and merge.
  env_logger::init();

  // A 1 MiB arena: one free block of order 20.
  let mut pool = BuddyPool::new(1 << MIN_K)?;

  println!(
    "PID = {}, arena base = {:?}, kval_m = {}, header = {} bytes",
    std::process::id(),
    pool.base(),
    pool.kval_m(),
    HEADER_SIZE,
  );
  print_free_lists("start", &pool.stats());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Allocate a u32. The arena is split all the way down to order 6,
  //    leaving one free buddy on every level on the way.
  // --------------------------------------------------------------------
  let first = pool.malloc(size_of::<u32>())?;
  unsafe { (first.as_ptr() as *mut u32).write(0xDEADBEEF) };
  println!("\n[1] Allocate u32 at {:?}, usable = {}", first, pool.usable_size(first)?);
  print_free_lists("1", &pool.stats());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Allocate 12 bytes. The spare order-6 buddy from step 1 is reused
  //    without any further split.
  // --------------------------------------------------------------------
  let second = pool.malloc(12)?;
  unsafe { second.as_ptr().write_bytes(0xAB, 12) };
  println!("\n[2] Allocate [u8; 12] at {:?}", second);
  print_free_lists("2", &pool.stats());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Grow the second block past its order. The contents move.
  // --------------------------------------------------------------------
  let grown = unsafe { pool.realloc(second.as_ptr(), 1000)? }.expect("non-zero resize returns a block");
  println!(
    "\n[3] Grow to 1000 bytes: {:?} -> {:?}, first byte = 0x{:X}",
    second,
    grown,
    unsafe { *grown.as_ptr() },
  );
  print_free_lists("3", &pool.stats());
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) Free the first block, then allocate 2 bytes. The freed block merges
  //    with its free buddies, and splitting the merged block again lands the
  //    new allocation on the same address.
  // --------------------------------------------------------------------
  unsafe { pool.free(first.as_ptr())? };
  let third = pool.malloc(2)?;
  println!(
    "\n[4] third == first? {}",
    if third == first {
      "Yes, it reused the freed block"
    } else {
      "No, it allocated somewhere else"
    }
  );
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) Freeing the same pointer twice is reported, not absorbed.
  // --------------------------------------------------------------------
  unsafe {
    pool.free(third.as_ptr())?;

    if let Err(err) = pool.free(third.as_ptr()) {
      println!("\n[5] second free rejected: {err}");
    }
  }

  // --------------------------------------------------------------------
  // 6) Release everything. Buddies merge back into a single order-20
  //    block.
  // --------------------------------------------------------------------
  unsafe { pool.free(grown.as_ptr())? };
  let stats = pool.stats();
  print_free_lists("6", &stats);
  println!("[6] splits = {}, merges = {}", stats.splits, stats.merges);

  pool.destroy()?;
  println!("\n[7] Arena unmapped.");

  Ok(())
}
