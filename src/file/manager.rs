use anyhow::Result;
use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
    sync::{Arc, Mutex},
};

use super::{block_id::BlockId, page::Page};

#[derive(Debug)]
pub struct FileManager {
    db_dir: String,
    block_size: usize,
    is_new: bool,
    open_files: HashMap<String, Arc<Mutex<File>>>,
    total_blocks_read: usize,
    total_blocks_write: usize,
}

impl FileManager {
    pub fn new(db_dir: &str, block_size: usize) -> Result<Self> {
        let path = Path::new(db_dir);
        let is_new = !path.exists();

        if is_new {
            std::fs::create_dir_all(path)?;
        }

        // Remove any leftover temporary tables
        std::fs::read_dir(path)?
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(|name| name.starts_with("temp"))
            })
            .try_for_each(std::fs::remove_file)?;

        Ok(Self {
            db_dir: db_dir.to_string(),
            block_size,
            is_new,
            open_files: HashMap::new(),
            total_blocks_read: 0,
            total_blocks_write: 0,
        })
    }

    pub fn read(&mut self, block: &BlockId, page: &mut Page) -> Result<()> {
        let file = self.get_file(block.filename())?;
        let mut guard = file.lock().unwrap();
        let pos = block.block_number() as u64 * self.block_size as u64;
        guard.seek(SeekFrom::Start(pos))?;

        let block_len = page.contents().len();
        if guard.metadata()?.len() >= pos + block_len as u64 {
            let mut temp_buf = vec![0u8; block_len];
            guard.read_exact(&mut temp_buf)?;
            page.contents().clear();
            page.contents().write_bytes(&temp_buf);
        } else {
            // Reading past end-of-file yields a zeroed page; the frame's
            // previous binding must not leak into this one.
            page.contents().clear();
            page.contents().write_bytes(&vec![0u8; block_len]);
        }

        self.total_blocks_read += 1;

        Ok(())
    }

    pub fn write(&mut self, block: &BlockId, page: &mut Page) -> Result<()> {
        let file = self.get_file(block.filename())?;
        let mut guard = file.lock().unwrap();
        guard.seek(SeekFrom::Start(
            block.block_number() as u64 * self.block_size as u64,
        ))?;
        guard.write_all(page.contents().as_bytes())?;
        guard.sync_all()?;

        self.total_blocks_write += 1;

        Ok(())
    }

    pub fn append(&mut self, filename: &str) -> Result<BlockId> {
        let new_block_number = self.length(filename)? as i64;
        let block = BlockId::new(filename, new_block_number);
        let bytes = vec![0u8; self.block_size];

        let file = self.get_file(block.filename())?;
        let mut guard = file.lock().unwrap();
        guard.seek(SeekFrom::Start(
            block.block_number() as u64 * self.block_size as u64,
        ))?;
        guard.write_all(&bytes)?;
        guard.sync_all()?;

        self.total_blocks_write += 1;

        Ok(block)
    }

    pub fn length(&mut self, filename: &str) -> Result<usize> {
        let file = self.get_file(filename)?;
        let guard = file.lock().unwrap();
        let len = guard.metadata()?.len();

        //ceiling
        Ok((len as usize + self.block_size - 1) / self.block_size)
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn get_total_blocks_read(&self) -> usize {
        self.total_blocks_read
    }

    pub fn get_total_blocks_write(&self) -> usize {
        self.total_blocks_write
    }

    fn get_file(&mut self, filename: &str) -> Result<Arc<Mutex<File>>> {
        if let Some(file) = self.open_files.get(filename) {
            Ok(Arc::clone(file))
        } else {
            let path = Path::new(&self.db_dir).join(filename);

            let file = Arc::new(Mutex::new(
                OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .open(&path)?,
            ));

            self.open_files
                .insert(filename.to_string(), Arc::clone(&file));

            Ok(file)
        }
    }
}
